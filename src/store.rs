use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::fix::Fix;
use crate::observable::{Observable, SubscriptionId};
use crate::session::Session;

/// How the current session's duration advances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    /// One-second ticks from the tracker; freezes while paused
    #[default]
    Ticks,
    /// Wall-clock time since start, recomputed on every fix
    WallClock,
}

/// Single-slot holder of the current session.
///
/// All mutation of the active session goes through this type.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: Observable<Option<Session>>,
    is_running: Observable<bool>,
    duration_policy: DurationPolicy,
}

impl SessionStore {
    pub fn new(duration_policy: DurationPolicy) -> Self {
        Self {
            current: Observable::new(None),
            is_running: Observable::new(false),
            duration_policy,
        }
    }

    pub fn duration_policy(&self) -> DurationPolicy {
        self.duration_policy
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.get().as_ref()
    }

    pub fn is_running(&self) -> bool {
        *self.is_running.get()
    }

    /// Install a fresh session, discarding any previous one
    pub fn start_new_session(&mut self) -> Uuid {
        let session = Session::new();
        let id = session.id();
        if let Some(old) = self.current.get() {
            debug!(discarded = %old.id(), "replacing unfinished session");
        }
        self.current.set(Some(session));
        self.is_running.set(true);
        debug!(session = %id, "session started");
        id
    }

    /// Clear the current session and hand it back as finished data
    pub fn end_current_session(&mut self) -> Option<Session> {
        let finished = self.current.update(Option::take);
        self.is_running.set(false);
        if let Some(ref s) = finished {
            debug!(
                session = %s.id(),
                distance_km = s.distance_km(),
                duration_secs = s.duration_secs(),
                "session ended"
            );
        }
        finished
    }

    pub fn update_current_session(&mut self, fix: Fix) {
        if self.current.get().is_none() {
            trace!("fix without a current session ignored");
            return;
        }
        let policy = self.duration_policy;
        self.current.update(|slot| {
            if let Some(session) = slot {
                session.append_location(fix);
                if policy == DurationPolicy::WallClock {
                    let elapsed = (Local::now() - session.started_at()).num_seconds().max(0);
                    session.set_duration_secs(elapsed as u64);
                }
                trace!(
                    lat = fix.latitude,
                    lon = fix.longitude,
                    distance_km = session.distance_km(),
                    "fix appended"
                );
            }
        });
    }

    pub fn tick_current_session(&mut self, elapsed_secs: u64) {
        if self.duration_policy != DurationPolicy::Ticks || self.current.get().is_none() {
            return;
        }
        self.current.update(|slot| {
            if let Some(session) = slot {
                session.tick(elapsed_secs);
            }
        });
    }

    pub fn subscribe_current(
        &mut self,
        listener: impl FnMut(&Option<Session>) + 'static,
    ) -> SubscriptionId {
        self.current.subscribe(listener)
    }

    pub fn subscribe_running(&mut self, listener: impl FnMut(&bool) + 'static) -> SubscriptionId {
        self.is_running.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn start_installs_session_and_sets_running() {
        let mut store = SessionStore::default();
        assert!(store.current().is_none());
        assert!(!store.is_running());

        let id = store.start_new_session();
        assert_eq!(store.current().map(Session::id), Some(id));
        assert!(store.is_running());
    }

    #[test]
    fn start_replaces_previous_session() {
        let mut store = SessionStore::default();
        let first = store.start_new_session();
        store.update_current_session(Fix::new(37.0, 127.0, Utc::now()));
        let second = store.start_new_session();

        assert_ne!(first, second);
        assert!(store.current().unwrap().locations().is_empty());
    }

    #[test]
    fn end_clears_and_returns_session() {
        let mut store = SessionStore::default();
        let id = store.start_new_session();
        let finished = store.end_current_session().unwrap();

        assert_eq!(finished.id(), id);
        assert!(store.current().is_none());
        assert!(!store.is_running());
        assert!(store.end_current_session().is_none());
    }

    #[test]
    fn update_without_session_is_noop() {
        let mut store = SessionStore::default();
        let calls = Rc::new(RefCell::new(0));
        let c = Rc::clone(&calls);
        store.subscribe_current(move |_| *c.borrow_mut() += 1);

        store.update_current_session(Fix::new(37.0, 127.0, Utc::now()));
        assert!(store.current().is_none());
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn subscribers_see_every_mutation() {
        let mut store = SessionStore::default();
        let seen: Rc<RefCell<Vec<Option<usize>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe_current(move |s| sink.borrow_mut().push(s.as_ref().map(|s| s.locations().len())));

        store.start_new_session();
        store.update_current_session(Fix::new(37.0, 127.0, Utc::now()));
        store.update_current_session(Fix::new(37.001, 127.0, Utc::now()));
        store.end_current_session();

        assert_eq!(*seen.borrow(), vec![None, Some(0), Some(1), Some(2), None]);
    }

    #[test]
    fn ticks_only_apply_under_tick_policy() {
        let mut ticks = SessionStore::new(DurationPolicy::Ticks);
        ticks.start_new_session();
        ticks.tick_current_session(3);
        assert_eq!(ticks.current().unwrap().duration_secs(), 3);

        let mut wall = SessionStore::new(DurationPolicy::WallClock);
        wall.start_new_session();
        wall.tick_current_session(3);
        assert_eq!(wall.current().unwrap().duration_secs(), 0);
    }

    #[test]
    fn wall_clock_policy_recomputes_on_fix() {
        let mut store = SessionStore::new(DurationPolicy::WallClock);
        store.start_new_session();
        store.update_current_session(Fix::new(37.0, 127.0, Utc::now()));
        // started just now, so elapsed rounds down to zero or one second
        assert!(store.current().unwrap().duration_secs() <= 1);
    }
}
