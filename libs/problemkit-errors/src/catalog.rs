//! Static status/title definitions for the error taxonomy

use crate::problem::Problem;
use http::StatusCode;

/// Static problem definition from catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
}

/// Explicit "resource not found" signal.
pub const NOT_FOUND: ErrDef = ErrDef {
    status: 404,
    title: "Not Found",
};

/// Input rejected at the binding boundary.
pub const VALIDATION_FAILED: ErrDef = ErrDef {
    status: 422,
    title: "Validation errors occurred",
};

/// Application-level rule violation.
pub const BAD_REQUEST: ErrDef = ErrDef {
    status: 400,
    title: "Bad Request",
};

/// Downstream/external call failure.
pub const SERVICE_UNAVAILABLE: ErrDef = ErrDef {
    status: 503,
    title: "Service Unavailable",
};

/// Catch-all for unclassified faults.
pub const INTERNAL_ERROR: ErrDef = ErrDef {
    status: 500,
    title: "Internal error",
};

impl ErrDef {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        // Convert u16 to StatusCode, using INTERNAL_SERVER_ERROR as fallback for invalid codes
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Convert this definition into a Problem with the default `type` URI.
    #[inline]
    pub fn as_problem(&self) -> Problem {
        Problem::new(self.status_code(), self.title)
    }
}
