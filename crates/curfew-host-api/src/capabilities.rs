//! Host capabilities model

/// Describes what a window host can do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Can minimize (iconify) a window
    pub can_minimize: bool,

    /// Can terminate the process owning a window
    pub can_terminate: bool,

    /// Can drive a browser window to another address (synthetic input)
    pub can_force_navigate: bool,

    /// Can tell whether the session is locked
    pub can_detect_lock: bool,
}

impl HostCapabilities {
    /// Create minimal capabilities (minimize and terminate only)
    pub fn minimal() -> Self {
        Self {
            can_minimize: true,
            can_terminate: true,
            can_force_navigate: false,
            can_detect_lock: false,
        }
    }

    /// Create capabilities for an X11 session with XTEST and MIT-SCREEN-SAVER
    pub fn x11_full() -> Self {
        Self {
            can_minimize: true,
            can_terminate: true,
            can_force_navigate: true,
            can_detect_lock: true,
        }
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::minimal()
    }
}
