//! Guard engine: restriction state, refresh timing and rule evaluation

use curfew_config::{ConfigResult, ConfigSource, PolicyConfiguration, RestrictionAction, RestrictionPolicy};
use curfew_host_api::ObservedWindow;
use curfew_util::{MonotonicInstant, TimePoint};
use std::time::Duration;
use tracing::debug;

use crate::{GuardEvent, GuardState, PolicyHandle, fallback_is_restricted};

/// Default period between reloads of a remote configuration
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(1200);

/// The guard engine.
///
/// Holds no host or loader; the loop feeds it load results, clock readings
/// and observations, and it answers with state and events.
#[derive(Debug)]
pub struct GuardEngine {
    source: Option<ConfigSource>,
    policy: PolicyHandle,
    fallback_rules: RestrictionPolicy,
    refresh_interval: Duration,
    last_refresh: Option<MonotonicInstant>,
    state: Option<GuardState>,
    last_window: Option<ObservedWindow>,
}

impl GuardEngine {
    pub fn new(source: Option<ConfigSource>, refresh_interval: Duration) -> Self {
        Self {
            source,
            policy: PolicyHandle::new(),
            fallback_rules: RestrictionPolicy::builtin(),
            refresh_interval,
            last_refresh: None,
            state: None,
            last_window: None,
        }
    }

    pub fn source(&self) -> Option<&ConfigSource> {
        self.source.as_ref()
    }

    /// Shared handle to the active snapshot
    pub fn policy(&self) -> &PolicyHandle {
        &self.policy
    }

    /// Last computed state, `None` before the first evaluation
    pub fn state(&self) -> Option<GuardState> {
        self.state
    }

    /// Whether a reload should be attempted now.
    ///
    /// Only remote sources are refreshed. Until a load succeeds every call
    /// reports a refresh as due.
    pub fn refresh_due(&self, now_mono: MonotonicInstant) -> bool {
        match &self.source {
            Some(source) if source.is_remote() => match self.last_refresh {
                None => true,
                Some(last) => now_mono.duration_since(last) >= self.refresh_interval,
            },
            _ => false,
        }
    }

    /// Swap in a loaded snapshot, or keep the current one on failure
    pub fn apply_load(
        &mut self,
        result: ConfigResult<PolicyConfiguration>,
        now_mono: MonotonicInstant,
    ) -> GuardEvent {
        let source = self
            .source
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        match result {
            Ok(config) => {
                let event = GuardEvent::ConfigurationLoaded {
                    source,
                    enabled: config.enabled,
                    span_count: config.unrestricted_times.len(),
                    rule_count: config.policy.len(),
                    skipped_rules: config.skipped_rules.len(),
                };
                self.policy.replace(config);
                self.last_refresh = Some(now_mono);
                event
            }
            Err(e) => GuardEvent::ConfigurationRejected {
                source,
                error: e.to_string(),
                kept_previous: self.policy.is_loaded(),
            },
        }
    }

    /// Restriction state at `point` under the active snapshot
    pub fn state_at(&self, point: TimePoint) -> GuardState {
        let restricted = match self.policy.snapshot() {
            Some(config) => config.is_restricted_at(point),
            None => fallback_is_restricted(point),
        };

        if restricted {
            GuardState::Restricted
        } else {
            GuardState::Unrestricted
        }
    }

    /// Recompute the state, reporting a transition if there was one
    pub fn update_state(&mut self, point: TimePoint) -> (GuardState, Option<GuardEvent>) {
        let next = self.state_at(point);
        let previous = self.state.replace(next);

        let event = (previous != Some(next)).then_some(GuardEvent::StateChanged {
            from: previous,
            to: next,
            at: point,
        });
        (next, event)
    }

    /// Record an observation; reports a focus change only for a new window
    pub fn observe(&mut self, window: &ObservedWindow, point: TimePoint) -> Option<GuardEvent> {
        if self.last_window.as_ref() == Some(window) {
            return None;
        }

        self.last_window = Some(window.clone());
        Some(GuardEvent::FocusChanged {
            window: window.clone(),
            at: point,
        })
    }

    /// Action for `window` under the active rules, or the built-in rules
    /// if no configuration was ever loaded
    pub fn evaluate(&self, window: &ObservedWindow) -> Option<RestrictionAction> {
        let process = window.process_name.as_deref();
        let title = window.title.as_deref();

        let action = match self.policy.snapshot() {
            Some(config) => config.policy.evaluate(process, title),
            None => self.fallback_rules.evaluate(process, title),
        };

        debug!(?action, pid = window.pid, "Window evaluated");
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curfew_config::{ConfigError, parse_config};
    use curfew_host_api::WindowHandle;

    fn point(weekday: u8, hour: u8, minute: u8) -> TimePoint {
        TimePoint::new(weekday, hour, minute).unwrap()
    }

    fn window(process: &str, title: &str) -> ObservedWindow {
        ObservedWindow::new(WindowHandle::new(1), 100, Some(process.into()), Some(title.into()))
    }

    fn remote() -> Option<ConfigSource> {
        Some(ConfigSource::Url("https://example.org/curfew.json".into()))
    }

    fn rejected() -> ConfigResult<PolicyConfiguration> {
        Err(ConfigError::ValidationFailed { errors: vec![] })
    }

    #[test]
    fn test_fallback_schedule_without_configuration() {
        let engine = GuardEngine::new(None, DEFAULT_REFRESH_INTERVAL);
        assert_eq!(engine.state_at(point(0, 12, 0)), GuardState::Restricted);
        assert_eq!(engine.state_at(point(2, 18, 0)), GuardState::Unrestricted);
        assert_eq!(engine.state_at(point(5, 9, 0)), GuardState::Restricted);
    }

    #[test]
    fn test_calendar_lists_exempt_windows() {
        let mut engine = GuardEngine::new(None, DEFAULT_REFRESH_INTERVAL);
        let config = parse_config(r#"{ "unrestricted_times": [[[0, 10, 0], [0, 12, 0]]] }"#);
        engine.apply_load(config, MonotonicInstant::now());

        assert_eq!(engine.state_at(point(0, 10, 0)), GuardState::Unrestricted);
        assert_eq!(engine.state_at(point(0, 11, 59)), GuardState::Unrestricted);
        assert_eq!(engine.state_at(point(0, 12, 0)), GuardState::Restricted);
        // Outside the calendar, the fallback schedule no longer applies
        assert_eq!(engine.state_at(point(2, 18, 0)), GuardState::Restricted);
    }

    #[test]
    fn test_disabled_configuration_never_restricts() {
        let mut engine = GuardEngine::new(None, DEFAULT_REFRESH_INTERVAL);
        engine.apply_load(parse_config(r#"{ "enabled": false }"#), MonotonicInstant::now());

        for weekday in 0..7 {
            assert_eq!(engine.state_at(point(weekday, 3, 0)), GuardState::Unrestricted);
        }
    }

    #[test]
    fn test_failed_load_keeps_previous_snapshot() {
        let mut engine = GuardEngine::new(remote(), DEFAULT_REFRESH_INTERVAL);
        let now = MonotonicInstant::now();
        engine.apply_load(parse_config(r#"{ "enabled": false }"#), now);

        let event = engine.apply_load(rejected(), now);
        assert!(matches!(
            event,
            GuardEvent::ConfigurationRejected {
                kept_previous: true,
                ..
            }
        ));
        assert_eq!(engine.state_at(point(0, 12, 0)), GuardState::Unrestricted);
    }

    #[test]
    fn test_failed_first_load_keeps_fallback() {
        let mut engine = GuardEngine::new(remote(), DEFAULT_REFRESH_INTERVAL);
        let event = engine.apply_load(rejected(), MonotonicInstant::now());

        assert!(matches!(
            event,
            GuardEvent::ConfigurationRejected {
                kept_previous: false,
                ..
            }
        ));
        assert!(!engine.policy().is_loaded());
        assert_eq!(engine.state_at(point(2, 18, 0)), GuardState::Unrestricted);
    }

    #[test]
    fn test_refresh_only_for_remote_sources() {
        let now = MonotonicInstant::now();

        let local = GuardEngine::new(
            Some(ConfigSource::File("/etc/curfew/config.json".into())),
            DEFAULT_REFRESH_INTERVAL,
        );
        assert!(!local.refresh_due(now));

        let none = GuardEngine::new(None, DEFAULT_REFRESH_INTERVAL);
        assert!(!none.refresh_due(now));
    }

    #[test]
    fn test_refresh_timer() {
        let mut engine = GuardEngine::new(remote(), Duration::from_secs(1200));
        let start = MonotonicInstant::now();
        assert!(engine.refresh_due(start));

        engine.apply_load(parse_config("{}"), start);
        assert!(!engine.refresh_due(start + Duration::from_secs(1199)));
        assert!(engine.refresh_due(start + Duration::from_secs(1200)));
    }

    #[test]
    fn test_failed_refresh_is_retried() {
        let mut engine = GuardEngine::new(remote(), Duration::from_secs(1200));
        let start = MonotonicInstant::now();
        engine.apply_load(parse_config("{}"), start);

        let later = start + Duration::from_secs(1300);
        engine.apply_load(rejected(), later);
        assert!(engine.refresh_due(later + Duration::from_secs(4)));
    }

    #[test]
    fn test_state_changes_reported_once() {
        let mut engine = GuardEngine::new(None, DEFAULT_REFRESH_INTERVAL);

        let (state, event) = engine.update_state(point(0, 12, 0));
        assert_eq!(state, GuardState::Restricted);
        assert!(matches!(
            event,
            Some(GuardEvent::StateChanged {
                from: None,
                to: GuardState::Restricted,
                ..
            })
        ));

        let (_, event) = engine.update_state(point(0, 12, 4));
        assert!(event.is_none());

        let (state, event) = engine.update_state(point(2, 18, 0));
        assert_eq!(state, GuardState::Unrestricted);
        assert!(matches!(
            event,
            Some(GuardEvent::StateChanged {
                from: Some(GuardState::Restricted),
                to: GuardState::Unrestricted,
                ..
            })
        ));
    }

    #[test]
    fn test_focus_changes_are_deduplicated() {
        let mut engine = GuardEngine::new(None, DEFAULT_REFRESH_INTERVAL);
        let at = point(0, 12, 0);

        assert!(engine.observe(&window("steam", "Steam"), at).is_some());
        assert!(engine.observe(&window("steam", "Steam"), at).is_none());
        assert!(engine.observe(&window("steam", "Store"), at).is_some());
        assert!(engine.observe(&window("steam", "Steam"), at).is_some());
    }

    #[test]
    fn test_evaluate_uses_builtin_rules_without_configuration() {
        let engine = GuardEngine::new(None, DEFAULT_REFRESH_INTERVAL);
        assert_eq!(
            engine.evaluate(&window("firefox", "Mozilla Firefox")),
            Some(RestrictionAction::Terminate)
        );
        assert_eq!(engine.evaluate(&window("gedit", "notes.txt")), None);
    }

    #[test]
    fn test_evaluate_uses_configured_rules() {
        let mut engine = GuardEngine::new(None, DEFAULT_REFRESH_INTERVAL);
        let config = parse_config(
            r#"{ "rules": [
                { "title_regex": "Minecraft", "action": "minimize" },
                { "process_regex": "chrome", "action": "force_navigation" }
            ] }"#,
        );
        engine.apply_load(config, MonotonicInstant::now());

        assert_eq!(
            engine.evaluate(&window("chrome.exe", "Minecraft")),
            Some(RestrictionAction::Minimize)
        );
        assert_eq!(
            engine.evaluate(&window("chrome.exe", "News")),
            Some(RestrictionAction::ForceNavigation)
        );
        // Configured rules replace the built-in ones entirely
        assert_eq!(engine.evaluate(&window("firefox", "Mozilla Firefox")), None);
    }
}
