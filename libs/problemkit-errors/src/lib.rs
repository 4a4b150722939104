//! Core error types for problemkit
//!
//! This crate provides pure data types for turning faults into RFC 9457
//! Problem Details, with HTTP framework integration behind features:
//! - `Problem` document and its wire shape
//! - `Fault` / `FaultKind` taxonomy with an explicit ancestor table
//! - `FaultClassifier`, an ordered rule table with a guaranteed catch-all
//! - validation failures → 422 (`validation_problem`)
//! - `axum` feature: `IntoResponse for Problem` and `render`
//! - `validator` feature: `from_validator`
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
pub mod classifier;
pub mod fault;
pub mod problem;
pub mod validation;

// Re-export commonly used types
pub use catalog::ErrDef;
pub use classifier::{DetailPolicy, FaultClassifier, FaultClassifierBuilder, FaultRule};
pub use fault::{Fault, FaultKind};
#[cfg(feature = "axum")]
pub use problem::render;
pub use problem::{
    APPLICATION_PROBLEM_JSON, DEFAULT_TYPE_BASE, ERRORS_KEY, Extensions, Problem, RESERVED_MEMBERS,
    TRACE_ID_KEY,
};
#[cfg(feature = "validator")]
pub use validation::from_validator;
pub use validation::{
    FieldErrors, FieldNaming, ValidationError, collect_field_errors, validation_problem,
};

/// Per-request data every Problem carries: the request path and a
/// correlation identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub instance: String,
    pub trace_id: String,
}

impl RequestContext {
    pub fn new(instance: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            trace_id: trace_id.into(),
        }
    }
}

/// Attach `instance` and `traceId` from `ctx` to a Problem.
pub fn finalize(p: Problem, ctx: &RequestContext) -> Problem {
    p.with_instance(ctx.instance.clone())
        .with_trace_id(ctx.trace_id.clone())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn finalize_overwrites_previous_context() {
        let ctx = RequestContext::new("/b", "t2");
        let p = finalize(
            Problem::from_status(http::StatusCode::NOT_FOUND)
                .with_instance("/a")
                .with_trace_id("t1"),
            &ctx,
        );
        assert_eq!(p.instance.as_deref(), Some("/b"));
        assert_eq!(p.trace_id(), Some("t2"));
        assert_eq!(p.extensions.len(), 1);
    }
}
