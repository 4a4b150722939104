//! Validation failures → 422 Problem.
//!
//! Only the first message reported for a field is kept; later messages for the
//! same field are dropped.

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::RequestContext;
use crate::catalog::VALIDATION_FAILED;
use crate::problem::Problem;

/// A single failed constraint on an input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field path, e.g. `"email"` or `"address.city"`
    pub field: String,
    /// Human-readable message describing the failure
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Field name → first message, in discovery order.
pub type FieldErrors = IndexMap<String, String>;

/// How field identifiers are spelled in the `errors` member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldNaming {
    /// Keep the identifier as declared in the input type.
    AsDeclared,
    /// `first_name` → `firstName`
    #[default]
    CamelCase,
    /// `first_name` → `FirstName`
    PascalCase,
}

impl FieldNaming {
    /// Re-case a single path segment.
    #[must_use]
    pub fn apply(self, segment: &str) -> String {
        match self {
            Self::AsDeclared => segment.to_owned(),
            Self::CamelCase => segment.to_case(Case::Camel),
            Self::PascalCase => segment.to_case(Case::Pascal),
        }
    }
}

/// Collapse raw errors into one message per field.
pub fn collect_field_errors<I>(errors: I) -> FieldErrors
where
    I: IntoIterator<Item = ValidationError>,
{
    let mut fields = FieldErrors::new();
    for ValidationError { field, message } in errors {
        fields.entry(field).or_insert(message);
    }
    fields
}

/// Build the 422 Problem for `errors`, or `None` when there is nothing to report.
#[must_use]
pub fn validation_problem(errors: &[ValidationError], ctx: &RequestContext) -> Option<Problem> {
    if errors.is_empty() {
        return None;
    }
    let fields = collect_field_errors(errors.iter().cloned());
    let problem = crate::finalize(VALIDATION_FAILED.as_problem(), ctx).with_errors(fields);
    Some(problem)
}

#[cfg(feature = "validator")]
mod bridge {
    use super::{FieldNaming, ValidationError};
    use validator::{ValidationErrors, ValidationErrorsKind};

    /// Flatten `validator` output into field-path errors.
    ///
    /// Nested structs produce `outer.inner`, lists produce `items[0].name`.
    /// Output is sorted by path because `validator` reports fields in hash order.
    #[must_use]
    pub fn from_validator(errors: &ValidationErrors, naming: FieldNaming) -> Vec<ValidationError> {
        let mut out = Vec::new();
        flatten(errors, "", naming, &mut out);
        out.sort_by(|a, b| a.field.cmp(&b.field));
        out
    }

    fn flatten(
        errors: &ValidationErrors,
        prefix: &str,
        naming: FieldNaming,
        out: &mut Vec<ValidationError>,
    ) {
        for (name, kind) in errors.errors() {
            let segment = naming.apply(name);
            let path = if prefix.is_empty() {
                segment.clone()
            } else {
                format!("{prefix}.{segment}")
            };
            match kind {
                ValidationErrorsKind::Field(failures) => {
                    out.extend(failures.iter().map(|failure| {
                        let message = failure
                            .message
                            .as_ref()
                            .map_or_else(|| default_message(&failure.code, &segment), ToString::to_string);
                        ValidationError::new(path.clone(), message)
                    }));
                }
                ValidationErrorsKind::Struct(inner) => flatten(inner, &path, naming, out),
                ValidationErrorsKind::List(items) => {
                    for (index, inner) in items {
                        flatten(inner, &format!("{path}[{index}]"), naming, out);
                    }
                }
            }
        }
    }

    fn default_message(code: &str, field: &str) -> String {
        match code {
            "required" => format!("The {field} field is required."),
            "email" => format!("The {field} field is not a valid e-mail address."),
            "url" => format!("The {field} field is not a valid URL."),
            "length" => format!("The {field} field has an invalid length."),
            "range" => format!("The {field} field is out of range."),
            _ => format!("The {field} field is invalid."),
        }
    }
}

#[cfg(feature = "validator")]
pub use bridge::from_validator;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::StatusCode;

    fn ctx() -> RequestContext {
        RequestContext::new("/api/errors/people", "trace-7")
    }

    #[test]
    fn empty_input_means_success() {
        assert!(validation_problem(&[], &ctx()).is_none());
    }

    #[test]
    fn missing_field_yields_422_with_errors() {
        let errors = [ValidationError::new(
            "firstName",
            "The firstName field is required.",
        )];
        let p = validation_problem(&errors, &ctx()).unwrap();

        assert_eq!(p.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(p.title, "Validation errors occurred");
        assert_eq!(p.instance.as_deref(), Some("/api/errors/people"));
        assert_eq!(p.trace_id(), Some("trace-7"));
        assert_eq!(
            p.errors().and_then(|e| e.get("firstName")).and_then(|v| v.as_str()),
            Some("The firstName field is required.")
        );
    }

    #[test]
    fn keeps_first_message_per_field_in_discovery_order() {
        let fields = collect_field_errors([
            ValidationError::new("email", "first"),
            ValidationError::new("firstName", "required"),
            ValidationError::new("email", "second"),
        ]);

        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["email", "firstName"]);
        assert_eq!(fields["email"], "first");
    }

    #[test]
    fn field_naming_recases_segments() {
        assert_eq!(FieldNaming::CamelCase.apply("first_name"), "firstName");
        assert_eq!(FieldNaming::PascalCase.apply("first_name"), "FirstName");
        assert_eq!(FieldNaming::AsDeclared.apply("first_name"), "first_name");
    }

    #[cfg(feature = "validator")]
    mod validator_bridge {
        use super::super::*;
        use validator::Validate;

        #[derive(Validate)]
        struct Address {
            #[validate(length(min = 1))]
            postal_code: String,
        }

        #[derive(Validate)]
        struct Signup {
            #[validate(required)]
            first_name: Option<String>,
            #[validate(email)]
            email: Option<String>,
            #[validate(length(min = 2, message = "Nickname is too short"))]
            nick_name: String,
            #[validate(nested)]
            home_address: Address,
        }

        fn invalid() -> Signup {
            Signup {
                first_name: None,
                email: Some("not-an-email".to_owned()),
                nick_name: "x".to_owned(),
                home_address: Address {
                    postal_code: String::new(),
                },
            }
        }

        #[test]
        fn flattens_and_recases_fields() {
            let errors = invalid().validate().unwrap_err();
            let flat = from_validator(&errors, FieldNaming::CamelCase);
            let fields: Vec<_> = flat.iter().map(|e| e.field.as_str()).collect();

            assert_eq!(
                fields,
                ["email", "firstName", "homeAddress.postalCode", "nickName"]
            );
        }

        #[test]
        fn uses_custom_message_or_default_by_code() {
            let errors = invalid().validate().unwrap_err();
            let fields = collect_field_errors(from_validator(&errors, FieldNaming::CamelCase));

            assert_eq!(fields["firstName"], "The firstName field is required.");
            assert_eq!(
                fields["email"],
                "The email field is not a valid e-mail address."
            );
            assert_eq!(fields["nickName"], "Nickname is too short");
        }

        #[test]
        fn valid_input_produces_no_errors() {
            let ok = Signup {
                first_name: Some("Ada".to_owned()),
                email: Some("ada@example.com".to_owned()),
                nick_name: "ada".to_owned(),
                home_address: Address {
                    postal_code: "10115".to_owned(),
                },
            };
            assert!(ok.validate().is_ok());
        }
    }
}
