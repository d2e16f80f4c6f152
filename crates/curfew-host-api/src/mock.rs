//! Mock window host for testing

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{HostCapabilities, HostError, HostResult, ObservedWindow, WindowHandle, WindowHost};

/// An action the mock host was asked to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Minimize(WindowHandle),
    Terminate(u32),
    ForceNavigate(WindowHandle, String),
}

/// Mock window host for unit/integration testing
///
/// Clones share state, so a test can keep one clone while the guard owns another.
#[derive(Debug, Clone)]
pub struct MockHost {
    capabilities: HostCapabilities,

    /// Window reported as focused
    pub window: Arc<Mutex<Option<ObservedWindow>>>,

    /// Reported session lock state
    pub locked: Arc<Mutex<bool>>,

    /// Every action requested, in order
    pub calls: Arc<Mutex<Vec<HostCall>>>,

    /// Configure window observation to fail
    pub fail_observe: Arc<Mutex<bool>>,

    /// Configure minimize to fail
    pub fail_minimize: Arc<Mutex<bool>>,

    /// Configure terminate to fail
    pub fail_terminate: Arc<Mutex<bool>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            capabilities: HostCapabilities::x11_full(),
            window: Arc::new(Mutex::new(None)),
            locked: Arc::new(Mutex::new(false)),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_observe: Arc::new(Mutex::new(false)),
            fail_minimize: Arc::new(Mutex::new(false)),
            fail_terminate: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_capabilities(mut self, caps: HostCapabilities) -> Self {
        self.capabilities = caps;
        self
    }

    /// Focus a window with the given process name and title
    pub fn focus(&self, pid: u32, process_name: &str, title: &str) {
        let window = ObservedWindow::new(
            WindowHandle::new(u64::from(pid) << 8),
            pid,
            Some(process_name.to_string()),
            Some(title.to_string()),
        );
        self.set_window(Some(window));
    }

    pub fn set_window(&self, window: Option<ObservedWindow>) {
        *lock(&self.window) = window;
    }

    pub fn set_locked(&self, locked: bool) {
        *lock(&self.locked) = locked;
    }

    /// Snapshot of the actions requested so far
    pub fn calls(&self) -> Vec<HostCall> {
        lock(&self.calls).clone()
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowHost for MockHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    fn observed_window(&mut self) -> HostResult<Option<ObservedWindow>> {
        if *lock(&self.fail_observe) {
            return Err(HostError::Display("Mock observe failure".into()));
        }
        Ok(lock(&self.window).clone())
    }

    fn is_session_locked(&mut self) -> HostResult<bool> {
        Ok(*lock(&self.locked))
    }

    fn minimize(&mut self, handle: WindowHandle) -> HostResult<()> {
        lock(&self.calls).push(HostCall::Minimize(handle));
        if *lock(&self.fail_minimize) {
            return Err(HostError::WindowGone(handle));
        }
        Ok(())
    }

    fn terminate(&mut self, pid: u32) -> HostResult<()> {
        lock(&self.calls).push(HostCall::Terminate(pid));
        if *lock(&self.fail_terminate) {
            return Err(HostError::ProcessGone(pid));
        }

        // The process is gone, so is its window
        let mut window = lock(&self.window);
        if window.as_ref().is_some_and(|w| w.pid == pid) {
            *window = None;
        }
        Ok(())
    }

    fn force_navigate(&mut self, handle: WindowHandle, url: &str) -> HostResult<()> {
        if !self.capabilities.can_force_navigate {
            return Err(HostError::Unsupported);
        }
        lock(&self.calls).push(HostCall::ForceNavigate(handle, url.to_string()));
        Ok(())
    }
}
