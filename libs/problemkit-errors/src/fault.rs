//! Fault taxonomy: a tagged category plus an explicit ancestor table.

use std::fmt;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Category of a fault, arranged in a specificity hierarchy rooted at
/// [`FaultKind::Unclassified`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Root category; every fault is an `Unclassified` fault.
    Unclassified,
    /// Application-level rule violation.
    Application,
    /// A specific business rule was broken.
    BusinessRule,
    /// A call to an external service failed.
    DownstreamCall,
    /// A call to an external service did not answer in time.
    DownstreamTimeout,
    /// The operation was cancelled before completion.
    Cancelled,
    /// The requested operation exists but is not implemented.
    NotImplemented,
}

impl FaultKind {
    /// Direct ancestor of this category, `None` for the root.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Unclassified => None,
            Self::BusinessRule => Some(Self::Application),
            Self::DownstreamTimeout => Some(Self::DownstreamCall),
            Self::Application | Self::DownstreamCall | Self::Cancelled | Self::NotImplemented => {
                Some(Self::Unclassified)
            }
        }
    }

    /// This category followed by each ancestor up to the root.
    pub fn lineage(self) -> impl Iterator<Item = Self> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }

    /// `true` when `ancestor` is this category or one of its ancestors.
    #[must_use]
    pub fn is_a(self, ancestor: Self) -> bool {
        self.lineage().any(|kind| kind == ancestor)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unclassified => "unclassified",
            Self::Application => "application",
            Self::BusinessRule => "business_rule",
            Self::DownstreamCall => "downstream_call",
            Self::DownstreamTimeout => "downstream_timeout",
            Self::Cancelled => "cancelled",
            Self::NotImplemented => "not_implemented",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An abnormal outcome raised during request handling.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Fault {
    kind: FaultKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Unclassified, message)
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Application, message)
    }

    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::new(FaultKind::BusinessRule, message)
    }

    pub fn downstream(message: impl Into<String>) -> Self {
        Self::new(FaultKind::DownstreamCall, message)
    }

    pub fn downstream_timeout(message: impl Into<String>) -> Self {
        Self::new(FaultKind::DownstreamTimeout, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Cancelled, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(FaultKind::NotImplemented, message)
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
