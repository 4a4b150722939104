use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body of `POST /api/errors/people`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[validate(required)]
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}
