//! Panic capture: a panicking handler becomes an unclassified fault.

use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::error::{ApiError, Fault};

/// `CatchPanicLayer::custom` handler.
#[allow(clippy::needless_pass_by_value)] // signature fixed by tower-http
pub fn fault_from_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_owned());

    ApiError::from(Fault::unclassified(message)).into_response()
}
