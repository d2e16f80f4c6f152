//! Window host trait interfaces for curfew
//!
//! This crate defines the capability-based interface between the guard core
//! and platform-specific window systems. It contains no platform code itself.

mod capabilities;
mod handle;
mod mock;
mod traits;

pub use capabilities::*;
pub use handle::*;
pub use mock::*;
pub use traits::*;
