use serde::{Deserialize, Serialize};

/// How the `/api/errors` handlers are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerStyle {
    /// Named handler functions returning `ApiResult`, body validated by the
    /// `ValidatedJson` extractor.
    #[default]
    Controller,
    /// Inline closures returning bare statuses and validating explicitly.
    Minimal,
}

/// `modules.errors_demo.config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorsDemoConfig {
    pub style: HandlerStyle,
}
