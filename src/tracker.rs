use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::countdown::{Countdown, CountdownStep};
use crate::fix::{resolve_position, Fix};
use crate::observable::{Observable, SubscriptionId};
use crate::position::{Authorization, DefaultPosition, PositionProvider};
use crate::runtime::{RunEvent, Trigger};
use crate::session::Session;
use crate::stop_hold::{HoldOutcome, StopHold};
use crate::store::{DurationPolicy, SessionStore};
use crate::timer::TickScheduler;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    #[default]
    Stopped,
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerOptions {
    /// Run the 3-2-1-GO pre-roll before entering `Running`
    pub countdown: bool,
    /// Minimum hold on the stop control; `None` stops on release
    pub stop_hold: Option<Duration>,
    pub duration_policy: DurationPolicy,
    pub default_position: DefaultPosition,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            countdown: false,
            stop_hold: None,
            duration_policy: DurationPolicy::Ticks,
            default_position: DefaultPosition::default(),
        }
    }
}

impl From<&Config> for TrackerOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            countdown: cfg.countdown,
            stop_hold: cfg.stop_hold_ms.map(Duration::from_millis),
            duration_policy: cfg.duration_policy,
            default_position: cfg.default_position,
        }
    }
}

/// Session lifecycle: stopped -> running <-> paused -> stopped.
///
/// Owns the session store and the tick timer. Fixes reach the store only
/// while running; duration accrues one second per tick while running.
pub struct RunTracker<S: TickScheduler, P: PositionProvider> {
    store: SessionStore,
    state: Observable<SessionState>,
    elapsed_secs: Observable<u64>,
    countdown: Observable<Option<CountdownStep>>,
    stop_warning: Observable<bool>,
    last_position: Observable<Option<Fix>>,
    scheduler: S,
    positions: P,
    generation: u64,
    pending_countdown: Option<Countdown>,
    stop_hold: Option<StopHold>,
    options: TrackerOptions,
}

impl<S: TickScheduler, P: PositionProvider> RunTracker<S, P> {
    pub fn new(scheduler: S, positions: P, options: TrackerOptions) -> Self {
        Self {
            store: SessionStore::new(options.duration_policy),
            state: Observable::new(SessionState::Stopped),
            elapsed_secs: Observable::new(0),
            countdown: Observable::new(None),
            stop_warning: Observable::new(false),
            last_position: Observable::new(None),
            scheduler,
            positions,
            generation: 0,
            pending_countdown: None,
            stop_hold: options.stop_hold.map(StopHold::new),
            options,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.get()
    }

    pub fn elapsed_secs(&self) -> u64 {
        *self.elapsed_secs.get()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.store.current()
    }

    pub fn is_counting_down(&self) -> bool {
        self.pending_countdown.is_some()
    }

    pub fn countdown_step(&self) -> Option<CountdownStep> {
        *self.countdown.get()
    }

    pub fn stop_warning(&self) -> bool {
        *self.stop_warning.get()
    }

    pub fn tick_generation(&self) -> u64 {
        self.generation
    }

    pub fn positions(&self) -> &P {
        &self.positions
    }

    pub fn position_authorization(&self) -> Authorization {
        self.positions.authorization()
    }

    /// Last known position, or the configured default coordinate
    pub fn display_position(&self) -> Fix {
        resolve_position(*self.last_position.get(), self.options.default_position.into())
    }

    pub fn subscribe_state(&mut self, listener: impl FnMut(&SessionState) + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn subscribe_session(
        &mut self,
        listener: impl FnMut(&Option<Session>) + 'static,
    ) -> SubscriptionId {
        self.store.subscribe_current(listener)
    }

    pub fn subscribe_running(&mut self, listener: impl FnMut(&bool) + 'static) -> SubscriptionId {
        self.store.subscribe_running(listener)
    }

    pub fn subscribe_elapsed(&mut self, listener: impl FnMut(&u64) + 'static) -> SubscriptionId {
        self.elapsed_secs.subscribe(listener)
    }

    pub fn subscribe_countdown(
        &mut self,
        listener: impl FnMut(&Option<CountdownStep>) + 'static,
    ) -> SubscriptionId {
        self.countdown.subscribe(listener)
    }

    pub fn subscribe_stop_warning(&mut self, listener: impl FnMut(&bool) + 'static) -> SubscriptionId {
        self.stop_warning.subscribe(listener)
    }

    pub fn subscribe_position(
        &mut self,
        listener: impl FnMut(&Option<Fix>) + 'static,
    ) -> SubscriptionId {
        self.last_position.subscribe(listener)
    }

    /// Dispatch one runtime event. Returns the finished session when the
    /// event ended one.
    pub fn handle(&mut self, event: RunEvent) -> Option<Session> {
        match event {
            RunEvent::Trigger(Trigger::StartStop) => return self.toggle(),
            RunEvent::Trigger(Trigger::Pause) => {
                self.pause();
            }
            RunEvent::Trigger(Trigger::Resume) => {
                self.resume();
            }
            RunEvent::Fix(fix) => {
                self.on_fix(fix);
            }
            RunEvent::PositionUnavailable => self.on_position_unavailable(),
            RunEvent::Tick { generation } => self.on_tick(generation),
            RunEvent::Idle => {}
        }
        None
    }

    /// Start when stopped, stop (not pause) from any other state
    pub fn toggle(&mut self) -> Option<Session> {
        if self.state() == SessionState::Stopped && !self.is_counting_down() {
            self.start();
            None
        } else {
            self.stop()
        }
    }

    pub fn start(&mut self) {
        if self.is_counting_down() {
            debug!("start ignored, countdown in progress");
            return;
        }
        if self.state() != SessionState::Stopped {
            debug!(state = %self.state(), "start ignored");
            return;
        }
        if self.options.countdown {
            let countdown = Countdown::new();
            self.countdown.set(Some(countdown.current()));
            self.pending_countdown = Some(countdown);
            self.restart_timer();
            debug!("countdown started");
        } else {
            self.begin_running();
        }
    }

    pub fn stop(&mut self) -> Option<Session> {
        if self.pending_countdown.take().is_some() {
            self.cancel_timer();
            self.countdown.set(None);
            debug!("countdown cancelled");
            return None;
        }
        if self.state() == SessionState::Stopped {
            debug!("stop ignored, already stopped");
            return None;
        }

        self.cancel_timer();
        self.positions.stop_updates();
        let finished = self.store.end_current_session();
        self.elapsed_secs.set(0);
        if let Some(hold) = self.stop_hold.as_mut() {
            hold.reset();
        }
        self.stop_warning.set_if_changed(false);
        self.state.set(SessionState::Stopped);
        debug!("tracker stopped");
        finished
    }

    pub fn pause(&mut self) -> bool {
        if self.state() != SessionState::Running {
            debug!(state = %self.state(), "pause ignored");
            return false;
        }
        self.cancel_timer();
        self.positions.stop_updates();
        self.state.set(SessionState::Paused);
        debug!(elapsed_secs = self.elapsed_secs(), "tracker paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state() != SessionState::Paused {
            debug!(state = %self.state(), "resume ignored");
            return false;
        }
        self.state.set(SessionState::Running);
        self.positions.start_updates();
        self.restart_timer();
        debug!("tracker resumed");
        true
    }

    /// Feed a position fix; returns whether it reached the session
    pub fn on_fix(&mut self, fix: Fix) -> bool {
        self.last_position.set(Some(fix));
        if self.state() != SessionState::Running {
            trace!(state = %self.state(), "fix discarded");
            return false;
        }
        self.store.update_current_session(fix);
        true
    }

    pub fn on_position_unavailable(&mut self) {
        let pos = self.options.default_position;
        warn!(
            lat = pos.latitude,
            lon = pos.longitude,
            "position unavailable, showing default coordinate"
        );
        self.last_position.set(Some(Fix::fallback(pos.latitude, pos.longitude)));
    }

    pub fn on_tick(&mut self, generation: u64) {
        if generation != self.generation || self.scheduler.active_generation() != Some(generation) {
            trace!(generation, current = self.generation, "stale tick dropped");
            return;
        }

        if let Some(countdown) = self.pending_countdown.as_mut() {
            if let Some(step) = countdown.advance() {
                self.countdown.set(Some(step));
                if countdown.is_finished() {
                    self.pending_countdown = None;
                    self.countdown.set(None);
                    self.begin_running();
                }
            }
            return;
        }

        if self.state() == SessionState::Running {
            self.elapsed_secs.update(|secs| *secs += 1);
            self.store.tick_current_session(1);
        }
    }

    pub fn stop_pressed(&mut self, now: Instant) {
        if self.state() == SessionState::Stopped && !self.is_counting_down() {
            return;
        }
        if let Some(hold) = self.stop_hold.as_mut() {
            // key repeat must not restart the hold
            if hold.is_pressed() {
                return;
            }
            hold.press(now);
            self.stop_warning.set_if_changed(false);
        }
    }

    /// Release the stop control; stops when held long enough (or when no
    /// hold is required), otherwise raises the stop warning.
    pub fn stop_released(&mut self, now: Instant) -> Option<Session> {
        let (outcome, required) = match self.stop_hold.as_mut() {
            Some(hold) => (hold.release(now), hold.min_hold()),
            None => return self.stop(),
        };
        match outcome {
            HoldOutcome::Confirmed => self.stop(),
            HoldOutcome::TooShort { held } => {
                debug!(
                    held_ms = held.as_millis() as u64,
                    required_ms = required.as_millis() as u64,
                    "stop hold too short"
                );
                self.stop_warning.set_if_changed(true);
                None
            }
            HoldOutcome::NotPressed => None,
        }
    }

    fn begin_running(&mut self) {
        self.store.start_new_session();
        self.elapsed_secs.set(0);
        self.stop_warning.set_if_changed(false);
        self.state.set(SessionState::Running);
        self.positions.start_updates();
        self.restart_timer();
        debug!("tracker running");
    }

    fn restart_timer(&mut self) {
        self.scheduler.cancel();
        self.generation += 1;
        self.scheduler.schedule(self.generation);
    }

    fn cancel_timer(&mut self) {
        self.scheduler.cancel();
        self.generation += 1;
    }
}
