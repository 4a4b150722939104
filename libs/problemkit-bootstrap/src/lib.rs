//! Host bootstrap for problemkit services
//!
//! Layered configuration, logging initialization and shutdown signals for
//! the server binary.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod logging;
pub mod signals;

pub use config::*;
pub use logging::*;
pub use signals::*;
