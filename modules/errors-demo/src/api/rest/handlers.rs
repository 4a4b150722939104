//! Named handlers for the controller style.
//!
//! Failures are returned as `ApiError`; the problem-details middleware renders
//! them.
#![allow(clippy::unused_async)]

use axum::Json;
use problemkit::prelude::*;

use crate::api::rest::dto::Person;

pub async fn not_found() -> ApiResult<()> {
    Err(ApiError::NotFound)
}

pub async fn create_person(
    ValidatedJson(person): ValidatedJson<Person>,
) -> ApiResult<Json<&'static str>> {
    tracing::debug!(first_name = ?person.first_name, "person accepted");
    Ok(Json("Try not to set the FirstName"))
}

pub async fn exception() -> ApiResult<()> {
    Err(Fault::unclassified("Error 42").into())
}

pub async fn http_request_exception() -> ApiResult<()> {
    Err(Fault::downstream("External API calling error").into())
}

pub async fn application_exception() -> ApiResult<()> {
    Err(Fault::application("The request violates an application rule").into())
}

pub async fn downstream_timeout() -> ApiResult<()> {
    Err(Fault::downstream_timeout("External API did not answer in time").into())
}

/// # Panics
/// Always.
pub async fn panic() -> ApiResult<()> {
    panic!("handler panicked on purpose");
}
