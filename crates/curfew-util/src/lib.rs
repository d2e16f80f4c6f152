//! Shared utilities for curfew
//!
//! This crate provides:
//! - Weekly recurring time spans and the calendar built from them
//! - Time utilities (mockable wall clock, monotonic time)
//! - Error types for calendar construction
//! - Default paths for configuration and log files

mod error;
mod paths;
mod time;
mod weekly;

pub use error::*;
pub use paths::*;
pub use time::*;
pub use weekly::*;
