//! Carrying out restriction actions on the host

use curfew_config::RestrictionAction;
use curfew_host_api::{HostError, HostResult, ObservedWindow, WindowHost};
use std::time::Duration;
use tracing::debug;

use crate::{GuardEvent, GuardSettings};

/// Carry out `action` on `window`.
///
/// Host failures never abort the guard; each one is reported as a
/// [`GuardEvent::DispatchFailed`] and the action is not retried.
pub fn dispatch<H: WindowHost + ?Sized>(
    host: &mut H,
    action: RestrictionAction,
    window: &ObservedWindow,
    settings: &GuardSettings,
) -> Vec<GuardEvent> {
    let mut events = Vec::new();
    let caps = *host.capabilities();

    let outcome = match action {
        RestrictionAction::Ignore => {
            debug!(pid = window.pid, "Window ignored by rule");
            return events;
        }
        RestrictionAction::Minimize => minimize(host, caps.can_minimize, window),
        RestrictionAction::Terminate => {
            // Hide the window right away; the process may take a while to exit
            if let Err((step, e)) = minimize(host, caps.can_minimize, window) {
                events.push(failure(action, step, window, e));
            }
            terminate(host, caps.can_terminate, window)
        }
        RestrictionAction::ForceNavigation => {
            if caps.can_force_navigate {
                pause(settings.navigation_delay);
                let result = host
                    .force_navigate(window.handle, &settings.navigate_to)
                    .map_err(|e| ("navigate", e));
                pause(settings.navigation_settle);
                result
            } else {
                Err(("navigate", HostError::Unsupported))
            }
        }
    };

    match outcome {
        Ok(()) => events.push(GuardEvent::ActionDispatched {
            action,
            window: window.clone(),
        }),
        Err((step, e)) => events.push(failure(action, step, window, e)),
    }

    events
}

type StepResult = Result<(), (&'static str, HostError)>;

fn minimize<H: WindowHost + ?Sized>(host: &mut H, supported: bool, window: &ObservedWindow) -> StepResult {
    step("minimize", supported, || host.minimize(window.handle))
}

fn terminate<H: WindowHost + ?Sized>(host: &mut H, supported: bool, window: &ObservedWindow) -> StepResult {
    if !window.has_pid() {
        return Err((
            "terminate",
            HostError::Internal("owning process unknown".into()),
        ));
    }
    step("terminate", supported, || host.terminate(window.pid))
}

fn step(name: &'static str, supported: bool, call: impl FnOnce() -> HostResult<()>) -> StepResult {
    if !supported {
        return Err((name, HostError::Unsupported));
    }
    call().map_err(|e| (name, e))
}

fn failure(
    action: RestrictionAction,
    step: &'static str,
    window: &ObservedWindow,
    error: HostError,
) -> GuardEvent {
    GuardEvent::DispatchFailed {
        action,
        step,
        window: window.clone(),
        error: error.to_string(),
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curfew_host_api::{HostCall, HostCapabilities, MockHost, WindowHandle};

    fn settings() -> GuardSettings {
        GuardSettings::immediate()
    }

    fn window(pid: u32) -> ObservedWindow {
        ObservedWindow::new(
            WindowHandle::new(0xa0),
            pid,
            Some("chrome".into()),
            Some("Minecraft Classic".into()),
        )
    }

    #[test]
    fn test_minimize() {
        let mut host = MockHost::new();
        let events = dispatch(&mut host, RestrictionAction::Minimize, &window(10), &settings());

        assert_eq!(host.calls(), vec![HostCall::Minimize(WindowHandle::new(0xa0))]);
        assert!(matches!(events.as_slice(), [GuardEvent::ActionDispatched { .. }]));
    }

    #[test]
    fn test_terminate_minimizes_first() {
        let mut host = MockHost::new();
        dispatch(&mut host, RestrictionAction::Terminate, &window(10), &settings());

        assert_eq!(
            host.calls(),
            vec![
                HostCall::Minimize(WindowHandle::new(0xa0)),
                HostCall::Terminate(10)
            ]
        );
    }

    #[test]
    fn test_terminate_proceeds_when_minimize_fails() {
        let mut host = MockHost::new();
        *host.fail_minimize.lock().unwrap() = true;

        let events = dispatch(&mut host, RestrictionAction::Terminate, &window(10), &settings());

        assert_eq!(host.calls().last(), Some(&HostCall::Terminate(10)));
        assert!(matches!(
            events.as_slice(),
            [
                GuardEvent::DispatchFailed { step: "minimize", .. },
                GuardEvent::ActionDispatched { .. }
            ]
        ));
    }

    #[test]
    fn test_terminate_failure_is_reported() {
        let mut host = MockHost::new();
        *host.fail_terminate.lock().unwrap() = true;

        let events = dispatch(&mut host, RestrictionAction::Terminate, &window(10), &settings());

        assert!(matches!(
            events.as_slice(),
            [GuardEvent::DispatchFailed {
                action: RestrictionAction::Terminate,
                step: "terminate",
                ..
            }]
        ));
    }

    #[test]
    fn test_terminate_without_pid() {
        let mut host = MockHost::new();
        let events = dispatch(&mut host, RestrictionAction::Terminate, &window(0), &settings());

        assert!(!host.calls().contains(&HostCall::Terminate(0)));
        assert!(matches!(
            events.as_slice(),
            [GuardEvent::DispatchFailed { step: "terminate", .. }]
        ));
    }

    #[test]
    fn test_force_navigation_uses_destination() {
        let mut host = MockHost::new();
        let mut settings = settings();
        settings.navigate_to = "https://example.org/".into();

        dispatch(&mut host, RestrictionAction::ForceNavigation, &window(10), &settings);

        assert_eq!(
            host.calls(),
            vec![HostCall::ForceNavigate(
                WindowHandle::new(0xa0),
                "https://example.org/".into()
            )]
        );
    }

    #[test]
    fn test_force_navigation_unsupported() {
        let mut host = MockHost::new().with_capabilities(HostCapabilities::minimal());
        let events = dispatch(&mut host, RestrictionAction::ForceNavigation, &window(10), &settings());

        assert!(host.calls().is_empty());
        assert!(matches!(
            events.as_slice(),
            [GuardEvent::DispatchFailed { step: "navigate", .. }]
        ));
    }

    #[test]
    fn test_ignore_does_nothing() {
        let mut host = MockHost::new();
        let events = dispatch(&mut host, RestrictionAction::Ignore, &window(10), &settings());

        assert!(host.calls().is_empty());
        assert!(events.is_empty());
    }
}
