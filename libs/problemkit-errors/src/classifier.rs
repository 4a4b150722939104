//! Ordered fault → Problem mapping with a guaranteed catch-all.

use std::fmt;

use crate::RequestContext;
use crate::catalog::{BAD_REQUEST, INTERNAL_ERROR, SERVICE_UNAVAILABLE};
use crate::fault::{Fault, FaultKind};
use crate::problem::Problem;

type BuildFn = dyn Fn(&Fault) -> Problem + Send + Sync;

/// Whether the catch-all rule exposes the fault message as `detail`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailPolicy {
    #[default]
    Expose,
    Redact,
}

/// Pairs a fault category with the builder that renders faults of that
/// category (or any descendant).
pub struct FaultRule {
    kind: FaultKind,
    build: Box<BuildFn>,
}

impl FaultRule {
    pub fn new<F>(kind: FaultKind, build: F) -> Self
    where
        F: Fn(&Fault) -> Problem + Send + Sync + 'static,
    {
        Self {
            kind,
            build: Box::new(build),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    #[must_use]
    pub fn matches(&self, fault: &Fault) -> bool {
        fault.kind().is_a(self.kind)
    }
}

impl fmt::Debug for FaultRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultRule")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Immutable rule table consulted for every fault.
///
/// Rules are tried in registration order and the first match wins. The
/// catch-all is stored apart from the table and always consulted last, so
/// [`FaultClassifier::classify`] is total.
#[derive(Debug)]
pub struct FaultClassifier {
    rules: Vec<FaultRule>,
    catch_all: FaultRule,
}

impl FaultClassifier {
    pub fn builder() -> FaultClassifierBuilder {
        FaultClassifierBuilder { rules: Vec::new() }
    }

    /// Downstream failures → 503, application faults → 400, anything else
    /// → 500 "Internal error".
    #[must_use]
    pub fn standard(detail: DetailPolicy) -> Self {
        Self::builder()
            .map(FaultKind::DownstreamCall, |_| SERVICE_UNAVAILABLE.as_problem())
            .map(FaultKind::Application, |_| BAD_REQUEST.as_problem())
            .build(move |fault| match detail {
                DetailPolicy::Expose => INTERNAL_ERROR.as_problem().with_detail(fault.message()),
                DetailPolicy::Redact => INTERNAL_ERROR.as_problem(),
            })
    }

    /// Select the rule for `fault` and build its Problem with request context.
    pub fn classify(&self, fault: &Fault, ctx: &RequestContext) -> Problem {
        let rule = self.select(fault);
        crate::finalize((rule.build)(fault), ctx)
    }

    /// Category of the rule that [`classify`](Self::classify) would use.
    #[must_use]
    pub fn matched_kind(&self, fault: &Fault) -> FaultKind {
        self.select(fault).kind
    }

    pub fn rules(&self) -> impl Iterator<Item = &FaultRule> {
        self.rules.iter().chain(std::iter::once(&self.catch_all))
    }

    fn select(&self, fault: &Fault) -> &FaultRule {
        self.rules
            .iter()
            .find(|rule| rule.matches(fault))
            .unwrap_or(&self.catch_all)
    }
}

impl Default for FaultClassifier {
    fn default() -> Self {
        Self::standard(DetailPolicy::default())
    }
}

/// Collects rules in priority order; see [`FaultClassifier::builder`].
#[must_use]
pub struct FaultClassifierBuilder {
    rules: Vec<FaultRule>,
}

impl FaultClassifierBuilder {
    /// Register `build` for faults of `kind` and its descendants.
    pub fn map<F>(mut self, kind: FaultKind, build: F) -> Self
    where
        F: Fn(&Fault) -> Problem + Send + Sync + 'static,
    {
        if let Some(earlier) = self.rules.iter().find(|rule| kind.is_a(rule.kind)) {
            tracing::warn!(
                kind = %kind,
                shadowed_by = %earlier.kind,
                "fault rule is unreachable: an earlier rule already matches this category"
            );
        }
        self.rules.push(FaultRule::new(kind, build));
        self
    }

    /// Finish the table with the catch-all rule for the root category.
    pub fn build<F>(self, catch_all: F) -> FaultClassifier
    where
        F: Fn(&Fault) -> Problem + Send + Sync + 'static,
    {
        FaultClassifier {
            rules: self.rules,
            catch_all: FaultRule::new(FaultKind::Unclassified, catch_all),
        }
    }
}
