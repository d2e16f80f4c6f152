//! Window host traits

use thiserror::Error;

use crate::{HostCapabilities, ObservedWindow, WindowHandle};

/// Errors from window host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Operation not supported by this host")]
    Unsupported,

    #[error("Window {0} no longer exists")]
    WindowGone(WindowHandle),

    #[error("Process {0} no longer exists")]
    ProcessGone(u32),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Display error: {0}")]
    Display(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Window host trait - implemented by platform-specific window systems
///
/// Calls are blocking; the guard drives the host from its own thread.
pub trait WindowHost: Send {
    /// Get the capabilities of this host
    fn capabilities(&self) -> &HostCapabilities;

    /// The focused window, or `None` if nothing has focus
    fn observed_window(&mut self) -> HostResult<Option<ObservedWindow>>;

    /// Whether the interactive session is currently locked
    fn is_session_locked(&mut self) -> HostResult<bool>;

    /// Minimize (iconify) a window
    fn minimize(&mut self, handle: WindowHandle) -> HostResult<()>;

    /// Terminate a process, escalating if it does not exit
    fn terminate(&mut self, pid: u32) -> HostResult<()>;

    /// Optional: focus a browser window and send it to `url`
    fn force_navigate(&mut self, _handle: WindowHandle, _url: &str) -> HostResult<()> {
        Err(HostError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare(HostCapabilities);

    impl WindowHost for Bare {
        fn capabilities(&self) -> &HostCapabilities {
            &self.0
        }

        fn observed_window(&mut self) -> HostResult<Option<ObservedWindow>> {
            Ok(None)
        }

        fn is_session_locked(&mut self) -> HostResult<bool> {
            Ok(false)
        }

        fn minimize(&mut self, _handle: WindowHandle) -> HostResult<()> {
            Ok(())
        }

        fn terminate(&mut self, _pid: u32) -> HostResult<()> {
            Ok(())
        }
    }

    #[test]
    fn force_navigate_defaults_to_unsupported() {
        let mut host = Bare(HostCapabilities::minimal());
        let result = host.force_navigate(WindowHandle::new(1), "https://example.org");
        assert!(matches!(result, Err(HostError::Unsupported)));
    }
}
