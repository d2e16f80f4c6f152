//! Guard state machine and action dispatch for curfew
//!
//! This crate is the heart of curfew, containing:
//! - Restriction state (Unrestricted <-> Restricted) from the active snapshot or the fallback schedule
//! - Atomic configuration snapshots with last-known-good retention
//! - Focus tracking and rule evaluation
//! - Action dispatch against a [`curfew_host_api::WindowHost`]
//! - The polling loop and its stop flag

mod dispatch;
mod engine;
mod events;
mod guard;
mod schedule;
mod snapshot;

pub use dispatch::*;
pub use engine::*;
pub use events::*;
pub use guard::*;
pub use schedule::*;
pub use snapshot::*;
