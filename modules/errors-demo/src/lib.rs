//! Errors demo module
//!
//! Serves `/api/errors/*` in one of two handler styles. Both styles expose the
//! same paths and return the same Problem documents; they differ only in how
//! handlers are written and in the success status of `POST /people`.

pub mod api;
pub mod config;

pub use api::rest::dto::Person;
pub use api::rest::routes::router;
pub use config::{ErrorsDemoConfig, HandlerStyle};

/// Key of this module under `modules` in the application config.
pub const MODULE_NAME: &str = "errors_demo";
