//! Linux window host for curfew
//!
//! Provides:
//! - Focused window lookup through EWMH properties on X11
//! - Session lock detection through the MIT-SCREEN-SAVER extension
//! - Window minimize via `WM_CHANGE_STATE`
//! - Graceful (SIGTERM) and forceful (SIGKILL) process termination
//! - Browser navigation by synthetic keyboard input (XTEST)

mod adapter;
mod keyboard;
mod process;

pub use adapter::*;
pub use keyboard::*;
pub use process::*;
