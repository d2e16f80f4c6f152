//! Events emitted by the guard

use curfew_config::RestrictionAction;
use curfew_host_api::ObservedWindow;
use curfew_util::TimePoint;
use std::fmt;
use tracing::{info, warn};

/// Restriction state of the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unrestricted,
    Restricted,
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrestricted => f.write_str("unrestricted"),
            Self::Restricted => f.write_str("restricted"),
        }
    }
}

/// Events emitted by the guard engine and dispatcher
#[derive(Debug, Clone)]
pub enum GuardEvent {
    /// A configuration snapshot was swapped in
    ConfigurationLoaded {
        source: String,
        enabled: bool,
        span_count: usize,
        rule_count: usize,
        skipped_rules: usize,
    },

    /// A load attempt failed; the previous snapshot stays active
    ConfigurationRejected {
        source: String,
        error: String,
        kept_previous: bool,
    },

    /// Restriction state changed (`from` is `None` on the first evaluation)
    StateChanged {
        from: Option<GuardState>,
        to: GuardState,
        at: TimePoint,
    },

    /// The focused window differs from the previous observation
    FocusChanged {
        window: ObservedWindow,
        at: TimePoint,
    },

    /// An action was carried out
    ActionDispatched {
        action: RestrictionAction,
        window: ObservedWindow,
    },

    /// A host call failed while carrying out an action
    DispatchFailed {
        action: RestrictionAction,
        step: &'static str,
        window: ObservedWindow,
        error: String,
    },
}

impl GuardEvent {
    /// Write the event to the log at its conventional level
    pub fn log(&self) {
        match self {
            Self::ConfigurationLoaded {
                source,
                enabled,
                span_count,
                rule_count,
                skipped_rules,
            } => info!(
                source = %source,
                enabled,
                span_count,
                rule_count,
                skipped_rules,
                "Configuration loaded"
            ),
            Self::ConfigurationRejected {
                source,
                error,
                kept_previous,
            } => warn!(
                source = %source,
                error = %error,
                kept_previous,
                "Configuration load failed"
            ),
            Self::StateChanged { from, to, at } => match from {
                Some(from) => info!(from = %from, to = %to, at = %at, "Restriction state changed"),
                None => info!(state = %to, at = %at, "Initial restriction state"),
            },
            Self::FocusChanged { window, at } => info!(
                process = window.process_name.as_deref().unwrap_or("?"),
                pid = window.pid,
                title = window.title.as_deref().unwrap_or(""),
                at = %at,
                "Focus changed"
            ),
            Self::ActionDispatched { action, window } => info!(
                action = %action,
                process = window.process_name.as_deref().unwrap_or("?"),
                pid = window.pid,
                title = window.title.as_deref().unwrap_or(""),
                "Action dispatched"
            ),
            Self::DispatchFailed {
                action,
                step,
                window,
                error,
            } => warn!(
                action = %action,
                step,
                pid = window.pid,
                error = %error,
                "Action failed"
            ),
        }
    }
}
