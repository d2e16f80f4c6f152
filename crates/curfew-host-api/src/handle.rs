//! Window handle abstraction

use std::fmt;

/// Opaque identifier of a top-level window on the host
///
/// On X11 this is the window XID; other hosts may use any stable number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(u64);

impl WindowHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// The currently focused window as seen by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedWindow {
    /// Window title, if the window exposes one
    pub title: Option<String>,

    /// Name of the owning process, if it could be resolved
    pub process_name: Option<String>,

    /// Owning process ID (0 if unknown)
    pub pid: u32,

    pub handle: WindowHandle,
}

impl ObservedWindow {
    pub fn new(
        handle: WindowHandle,
        pid: u32,
        process_name: Option<String>,
        title: Option<String>,
    ) -> Self {
        Self {
            title,
            process_name,
            pid,
            handle,
        }
    }

    /// Whether the owning process is known and can be signalled
    pub fn has_pid(&self) -> bool {
        self.pid != 0
    }
}

impl fmt::Display for ObservedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) \"{}\"",
            self.process_name.as_deref().unwrap_or("?"),
            self.pid,
            self.title.as_deref().unwrap_or("")
        )
    }
}
