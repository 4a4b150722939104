//! Problem Details pipeline for axum
//!
//! Handlers return [`ApiResult`]; the [`problem_details_middleware`] installed
//! by [`apply_problem_stack`] turns every failure (raised fault, explicit
//! not-found, binding/validation rejection, panic, bare error status) into an
//! `application/problem+json` response carrying `instance` and `traceId`.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod error;
pub mod extract;
pub mod layer;
pub mod panic;
pub mod request_id;
pub mod settings;
pub mod trace;

pub use error::{ApiError, ApiResult};
pub use extract::ValidatedJson;
pub use layer::{ProblemState, apply_problem_stack, problem_details_middleware, request_context};
pub use settings::ProblemSettings;

pub use problemkit_errors::{
    APPLICATION_PROBLEM_JSON, DetailPolicy, Fault, FaultClassifier, FaultKind, FieldNaming,
    Problem, RequestContext, ValidationError,
};

/// Prelude module that re-exports common types for handler authors
pub mod prelude {
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::extract::ValidatedJson;
    pub use problemkit_errors::{Fault, FaultKind, Problem};

    // Useful axum bits (common in handlers)
    pub use axum::{Json, http::StatusCode, response::IntoResponse};
}
