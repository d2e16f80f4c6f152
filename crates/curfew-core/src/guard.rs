//! The guard loop

use chrono::{DateTime, Local};
use curfew_config::{ConfigLoader, ConfigSource};
use curfew_host_api::WindowHost;
use curfew_util::{MonotonicInstant, TimePoint};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::{DEFAULT_REFRESH_INTERVAL, GuardEngine, GuardEvent, GuardState, dispatch};

/// Where force-navigated browser windows are sent by default
pub const DEFAULT_NAVIGATE_TO: &str = "https://en.wikipedia.org/wiki/Special:Random";

/// Longest single sleep between stop flag checks
const STOP_POLL_SLICE: Duration = Duration::from_millis(250);

/// Timing and destination settings for the guard
#[derive(Debug, Clone)]
pub struct GuardSettings {
    /// Poll cadence while restricted
    pub active_interval: Duration,

    /// Poll cadence while unrestricted
    pub idle_interval: Duration,

    /// Reload period for remote configuration
    pub refresh_interval: Duration,

    /// Address browsers are sent to by `force_navigation`
    pub navigate_to: String,

    /// Pause before navigating
    pub navigation_delay: Duration,

    /// Pause after navigating, so the page can load before the next poll
    pub navigation_settle: Duration,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            active_interval: Duration::from_secs(4),
            idle_interval: Duration::from_secs(30),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            navigate_to: DEFAULT_NAVIGATE_TO.to_string(),
            navigation_delay: Duration::from_secs(2),
            navigation_settle: Duration::from_secs(5),
        }
    }
}

impl GuardSettings {
    /// Default cadences without the navigation pauses
    pub fn immediate() -> Self {
        Self {
            navigation_delay: Duration::ZERO,
            navigation_settle: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Cancellation flag shared between the guard thread and signal handlers
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one guard iteration
#[derive(Debug)]
pub struct Iteration {
    pub state: GuardState,
    pub events: Vec<GuardEvent>,
    /// How long to wait before the next iteration
    pub sleep: Duration,
}

/// Polls the host and enforces the active configuration until stopped
pub struct GuardLoop<H: WindowHost, L: ConfigLoader> {
    host: H,
    loader: L,
    engine: GuardEngine,
    settings: GuardSettings,
    stop: StopFlag,
}

impl<H: WindowHost, L: ConfigLoader> GuardLoop<H, L> {
    /// Create the loop and perform the initial configuration load.
    ///
    /// A failed initial load is not fatal: the built-in schedule and rules
    /// stay active until a load succeeds.
    pub fn new(host: H, loader: L, source: Option<ConfigSource>, settings: GuardSettings) -> Self {
        let mut engine = GuardEngine::new(source, settings.refresh_interval);

        match engine.source().cloned() {
            Some(source) => {
                info!(source = %source, remote = source.is_remote(), "Loading configuration");
                let event = engine.apply_load(loader.load(&source), MonotonicInstant::now());
                event.log();
            }
            None => warn!("No configuration source available, using built-in schedule and rules"),
        }

        Self {
            host,
            loader,
            engine,
            settings,
            stop: StopFlag::new(),
        }
    }

    /// Use a flag created elsewhere, e.g. before the loop's thread exists
    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = stop;
        self
    }

    /// Flag that ends [`GuardLoop::run`] when set
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn engine(&self) -> &GuardEngine {
        &self.engine
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Run iterations until the stop flag is set
    pub fn run(&mut self) {
        info!(
            active_secs = self.settings.active_interval.as_secs(),
            idle_secs = self.settings.idle_interval.as_secs(),
            "Guard loop started"
        );

        while !self.stop.is_stopped() {
            let iteration = self.iterate(curfew_util::now(), MonotonicInstant::now());
            self.sleep(iteration.sleep);
        }

        info!("Guard loop stopped");
    }

    /// One pass: refresh, recompute state, observe and dispatch
    pub fn iterate(&mut self, now: DateTime<Local>, now_mono: MonotonicInstant) -> Iteration {
        let mut events = Vec::new();

        if self.engine.refresh_due(now_mono) {
            if let Some(source) = self.engine.source().cloned() {
                debug!(source = %source, "Refreshing configuration");
                let result = self.loader.load(&source);
                events.push(self.engine.apply_load(result, now_mono));
            }
        }

        let point = TimePoint::from_datetime(&now);
        let (state, change) = self.engine.update_state(point);
        events.extend(change);

        let sleep = match state {
            GuardState::Unrestricted => self.settings.idle_interval,
            GuardState::Restricted => {
                self.enforce(point, &mut events);
                self.settings.active_interval
            }
        };

        for event in &events {
            event.log();
        }

        Iteration { state, events, sleep }
    }

    fn enforce(&mut self, point: TimePoint, events: &mut Vec<GuardEvent>) {
        if self.host.capabilities().can_detect_lock {
            match self.host.is_session_locked() {
                Ok(true) => {
                    trace!("Session locked, skipping");
                    return;
                }
                Ok(false) => {}
                Err(e) => debug!(error = %e, "Lock state unavailable"),
            }
        }

        let window = match self.host.observed_window() {
            Ok(Some(window)) => window,
            Ok(None) => {
                trace!("No focused window");
                return;
            }
            Err(e) => {
                debug!(error = %e, "Focused window unavailable");
                return;
            }
        };

        events.extend(self.engine.observe(&window, point));

        if let Some(action) = self.engine.evaluate(&window) {
            events.extend(dispatch(&mut self.host, action, &window, &self.settings));
        }
    }

    fn sleep(&self, total: Duration) {
        let deadline = MonotonicInstant::now() + total;
        while !self.stop.is_stopped() {
            let remaining = deadline.duration_since(MonotonicInstant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(STOP_POLL_SLICE));
        }
    }
}
