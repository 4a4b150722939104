use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use problemkit::prelude::*;
use problemkit::{FieldNaming, ProblemSettings};
use serde_json::{Value, json};
use validator::Validate;

use crate::api::rest::dto::Person;
use crate::api::rest::handlers;
use crate::config::HandlerStyle;

pub const NOT_FOUND_PATH: &str = "/api/errors/notfound";
pub const PEOPLE_PATH: &str = "/api/errors/people";
pub const EXCEPTION_PATH: &str = "/api/errors/exception";
pub const HTTP_REQUEST_EXCEPTION_PATH: &str = "/api/errors/httprequestexception";
pub const APPLICATION_EXCEPTION_PATH: &str = "/api/errors/applicationexception";
pub const TIMEOUT_PATH: &str = "/api/errors/timeout";
pub const PANIC_PATH: &str = "/api/errors/panic";
pub const HEALTH_PATH: &str = "/health";

/// Routes for `style` plus `/health`. The problem-details stack is applied by
/// the host, not here.
pub fn router(style: HandlerStyle) -> Router {
    tracing::debug!(?style, "registering errors demo routes");
    let api = match style {
        HandlerStyle::Controller => controller_routes(),
        HandlerStyle::Minimal => minimal_routes(),
    };
    api.route(HEALTH_PATH, get(health))
}

fn controller_routes() -> Router {
    Router::new()
        .route(NOT_FOUND_PATH, get(handlers::not_found))
        .route(PEOPLE_PATH, post(handlers::create_person))
        .route(EXCEPTION_PATH, get(handlers::exception))
        .route(
            HTTP_REQUEST_EXCEPTION_PATH,
            get(handlers::http_request_exception),
        )
        .route(
            APPLICATION_EXCEPTION_PATH,
            get(handlers::application_exception),
        )
        .route(TIMEOUT_PATH, get(handlers::downstream_timeout))
        .route(PANIC_PATH, get(handlers::panic))
}

fn minimal_routes() -> Router {
    Router::new()
        // bare status, rendered by the middleware
        .route(NOT_FOUND_PATH, get(|| async { StatusCode::NOT_FOUND }))
        .route(
            PEOPLE_PATH,
            post(
                |settings: Option<Extension<ProblemSettings>>,
                 payload: Result<Json<Person>, JsonRejection>| async move {
                    let naming =
                        settings.map_or(FieldNaming::default(), |Extension(s)| s.field_naming);
                    let Json(person) = payload?;
                    person
                        .validate()
                        .map_err(|errors| ApiError::invalid(&errors, naming))?;
                    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
                },
            ),
        )
        .route(
            EXCEPTION_PATH,
            get(|| async { Err::<(), ApiError>(Fault::unclassified("Error 42").into()) }),
        )
        .route(
            HTTP_REQUEST_EXCEPTION_PATH,
            get(|| async {
                Err::<(), ApiError>(Fault::downstream("External API calling error").into())
            }),
        )
        .route(
            APPLICATION_EXCEPTION_PATH,
            get(|| async {
                Err::<(), ApiError>(
                    Fault::application("The request violates an application rule").into(),
                )
            }),
        )
        .route(
            TIMEOUT_PATH,
            get(|| async {
                Err::<(), ApiError>(
                    Fault::downstream_timeout("External API did not answer in time").into(),
                )
            }),
        )
        .route(PANIC_PATH, get(|| async { explode() }))
}

fn explode() -> StatusCode {
    panic!("inline handler panicked on purpose");
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_api_errors() {
        for path in [
            NOT_FOUND_PATH,
            PEOPLE_PATH,
            EXCEPTION_PATH,
            HTTP_REQUEST_EXCEPTION_PATH,
            APPLICATION_EXCEPTION_PATH,
            TIMEOUT_PATH,
            PANIC_PATH,
        ] {
            assert!(path.starts_with("/api/errors/"), "{path}");
        }
    }
}
