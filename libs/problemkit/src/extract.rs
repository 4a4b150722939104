//! Binding-boundary validation.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;
use crate::settings::ProblemSettings;

/// JSON body that is deserialized and validated before the handler runs.
///
/// On failure the handler is never called and the rejection is an
/// [`ApiError::Validation`] (or [`ApiError::Rejected`] for unusable bodies).
#[derive(Debug, Clone, Copy, Default)]
#[must_use]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let naming = req
            .extensions()
            .get::<ProblemSettings>()
            .map(|settings| settings.field_naming)
            .unwrap_or_default();

        let Json(value) = Json::<T>::from_request(req, state).await?;
        value
            .validate()
            .map_err(|errors| ApiError::invalid(&errors, naming))?;
        Ok(Self(value))
    }
}
