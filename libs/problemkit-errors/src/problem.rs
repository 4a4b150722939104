//! RFC 9457 Problem Details document (pure data model)

use http::StatusCode;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Base of the default `type` URI; the status code is appended.
pub const DEFAULT_TYPE_BASE: &str = "https://httpstatuses.io/";

/// Extension key holding the correlation identifier.
pub const TRACE_ID_KEY: &str = "traceId";

/// Extension key holding per-field validation messages.
pub const ERRORS_KEY: &str = "errors";

/// Standard members; an extension may not reuse these names.
pub const RESERVED_MEMBERS: [&str; 5] = ["status", "type", "title", "detail", "instance"];

/// Open extension bag, flattened into the top-level JSON object.
pub type Extensions = IndexMap<String, Value>;

/// Custom serializer for `StatusCode` to u16
#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// Custom deserializer for `StatusCode` from u16
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    StatusCode::from_u16(code).map_err(serde::de::Error::custom)
}

/// Canonical `type` URI for a status code.
#[must_use]
pub fn default_type_url(status: StatusCode) -> String {
    format!("{DEFAULT_TYPE_BASE}{}", status.as_u16())
}

/// RFC 9457 Problem Details for HTTP APIs.
///
/// `status` is the transport status as well: renderers read it from here, so
/// the body and the status line cannot disagree. A document without `type`
/// gets the default URI for its `status` when parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProblemDocument")]
#[must_use]
pub struct Problem {
    /// The HTTP status code for this occurrence of the problem.
    #[serde(serialize_with = "serialize_status_code")]
    pub status: StatusCode,
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// A human-readable explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The request path that produced the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Additional members (`traceId`, `errors`, ...). Keys never collide
    /// with [`RESERVED_MEMBERS`] when built through [`Problem::with_extension`].
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Wire form accepted when parsing; `type` is optional there.
#[derive(Deserialize)]
struct ProblemDocument {
    #[serde(deserialize_with = "deserialize_status_code")]
    status: StatusCode,
    #[serde(rename = "type", default)]
    type_url: Option<String>,
    title: String,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    instance: Option<String>,
    #[serde(flatten)]
    extensions: Extensions,
}

impl From<ProblemDocument> for Problem {
    fn from(doc: ProblemDocument) -> Self {
        Self {
            type_url: doc.type_url.unwrap_or_else(|| default_type_url(doc.status)),
            status: doc.status,
            title: doc.title,
            detail: doc.detail,
            instance: doc.instance,
            extensions: doc.extensions,
        }
    }
}

impl Problem {
    /// Create a Problem with an explicit title and the default `type` for `status`.
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            status,
            type_url: default_type_url(status),
            title: title.into(),
            detail: None,
            instance: None,
            extensions: Extensions::new(),
        }
    }

    /// Create a Problem whose title is the canonical reason phrase of `status`.
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or("Unknown Error"))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = Some(uri.into());
        self
    }

    pub fn with_trace_id(self, id: impl Into<String>) -> Self {
        self.with_extension(TRACE_ID_KEY, Value::String(id.into()))
    }

    /// Attach validation messages keyed by field name.
    pub fn with_errors<K, V>(self, errors: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = errors
            .into_iter()
            .map(|(field, message)| (field.into(), Value::String(message.into())))
            .collect::<serde_json::Map<_, _>>();
        self.with_extension(ERRORS_KEY, Value::Object(map))
    }

    /// Insert or replace an extension member. Names in [`RESERVED_MEMBERS`]
    /// are ignored; use the matching builder instead.
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if RESERVED_MEMBERS.contains(&key.as_str()) {
            tracing::warn!(%key, "ignoring extension that shadows a standard member");
            return self;
        }
        self.extensions.insert(key, value.into());
        self
    }

    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.extensions.get(TRACE_ID_KEY).and_then(Value::as_str)
    }

    #[must_use]
    pub fn errors(&self) -> Option<&serde_json::Map<String, Value>> {
        self.extensions.get(ERRORS_KEY).and_then(Value::as_object)
    }
}

/// Axum integration: make Problem directly usable as a response
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Problem {
    fn into_response(self) -> axum::response::Response {
        use axum::http::HeaderValue;

        let status = self.status;
        let mut resp = axum::Json(self).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

/// Write `problem` as an `application/problem+json` response.
#[cfg(feature = "axum")]
pub fn render(problem: Problem) -> axum::response::Response {
    axum::response::IntoResponse::into_response(problem)
}
