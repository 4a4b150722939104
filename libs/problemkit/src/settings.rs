//! Problem rendering policy shared by the middleware and extractors.

use problemkit_errors::{DetailPolicy, FieldNaming};
use serde::{Deserialize, Serialize};

/// Process-wide rendering knobs (config section `problem`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemSettings {
    /// Surface the message of unclassified faults as `detail`.
    pub expose_internal_detail: bool,
    /// Spelling of field names in validation `errors`.
    pub field_naming: FieldNaming,
}

impl Default for ProblemSettings {
    fn default() -> Self {
        Self {
            expose_internal_detail: true,
            field_naming: FieldNaming::default(),
        }
    }
}

impl ProblemSettings {
    #[must_use]
    pub fn detail_policy(&self) -> DetailPolicy {
        if self.expose_internal_detail {
            DetailPolicy::Expose
        } else {
            DetailPolicy::Redact
        }
    }
}
