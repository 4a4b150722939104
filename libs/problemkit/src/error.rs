//! Handler-facing error type.
//!
//! `ApiError` does not render itself. Its `IntoResponse` parks the error in the
//! response extensions, and [`problem_details_middleware`] turns it into a
//! Problem once, with the request path and trace id at hand.
//!
//! [`problem_details_middleware`]: crate::layer::problem_details_middleware

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use problemkit_errors::{FaultKind, FieldNaming};

pub use problemkit_errors::{Fault, ValidationError};

/// Failure outcome of a handler or of request binding.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Explicit "resource not found" signal; bypasses classification.
    #[error("resource not found")]
    NotFound,
    /// Input failed its declared constraints.
    #[error("request validation failed ({} error(s))", .0.len())]
    Validation(Vec<ValidationError>),
    /// The framework refused the request body (content type, size, etc.).
    #[error("request rejected: {detail}")]
    Rejected { status: StatusCode, detail: String },
    /// A raised fault, resolved through the classifier.
    #[error(transparent)]
    Fault(#[from] Fault),
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Status used when no problem-details middleware finishes the response.
    #[must_use]
    pub fn provisional_status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Rejected { status, .. } => *status,
            Self::Fault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Validation failure from `validator` output, with field names spelled
    /// per `naming`.
    #[must_use]
    pub fn invalid(errors: &validator::ValidationErrors, naming: FieldNaming) -> Self {
        Self::Validation(problemkit_errors::from_validator(errors, naming))
    }

    #[must_use]
    pub fn fault_kind(&self) -> Option<FaultKind> {
        match self {
            Self::Fault(fault) => Some(fault.kind()),
            _ => None,
        }
    }
}

/// Marker stored in response extensions until the middleware resolves it.
#[derive(Debug, Clone)]
pub(crate) struct PendingProblem(pub(crate) Arc<ApiError>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.provisional_status().into_response();
        response
            .extensions_mut()
            .insert(PendingProblem(Arc::new(self)));
        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Fault(Fault::unclassified(err.to_string()).with_source(err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::invalid(&errors, FieldNaming::default())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                Self::Validation(vec![ValidationError::new("$", e.body_text())])
            }
            JsonRejection::JsonSyntaxError(e) => {
                Self::Validation(vec![ValidationError::new("$", e.body_text())])
            }
            other => Self::Rejected {
                status: other.status(),
                detail: other.body_text(),
            },
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn into_response_parks_the_error() {
        let response = ApiError::from(Fault::downstream("x")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let pending = response.extensions().get::<PendingProblem>().unwrap();
        assert_eq!(pending.0.fault_kind(), Some(FaultKind::DownstreamCall));
    }

    #[test]
    fn anyhow_errors_become_unclassified_faults() {
        let err = ApiError::from(anyhow::anyhow!("Error 42"));
        assert_eq!(err.fault_kind(), Some(FaultKind::Unclassified));
        assert_eq!(err.to_string(), "Error 42");
    }

    #[test]
    fn provisional_status_per_variant() {
        assert_eq!(ApiError::NotFound.provisional_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Validation(vec![]).provisional_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        let rejected = ApiError::Rejected {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            detail: "Expected request with `Content-Type: application/json`".to_owned(),
        };
        assert_eq!(
            rejected.provisional_status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }
}
