use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::runtime::RunEvent;

/// Repeating tick source owned by the tracker.
///
/// At most one timer is live at a time; scheduling a new generation must
/// invalidate whatever was running before.
pub trait TickScheduler {
    fn schedule(&mut self, generation: u64);
    fn cancel(&mut self);
    fn active_generation(&self) -> Option<u64>;
}

struct TimerHandle {
    generation: u64,
    stop: Arc<AtomicBool>,
}

/// Timer backed by a sleeper thread that posts `RunEvent::Tick` into the
/// tracker's channel every interval.
pub struct ThreadTickScheduler {
    tx: Sender<RunEvent>,
    interval: Duration,
    active: Option<TimerHandle>,
}

impl ThreadTickScheduler {
    pub fn new(tx: Sender<RunEvent>, interval: Duration) -> Self {
        Self {
            tx,
            interval,
            active: None,
        }
    }
}

impl TickScheduler for ThreadTickScheduler {
    fn schedule(&mut self, generation: u64) {
        self.cancel();

        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let tx = self.tx.clone();
        let interval = self.interval;

        thread::spawn(move || loop {
            thread::sleep(interval);
            if flag.load(Ordering::Acquire) {
                break;
            }
            if tx.send(RunEvent::Tick { generation }).is_err() {
                break;
            }
        });

        self.active = Some(TimerHandle { generation, stop });
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.stop.store(true, Ordering::Release);
        }
    }

    fn active_generation(&self) -> Option<u64> {
        self.active.as_ref().map(|h| h.generation)
    }
}

impl Drop for ThreadTickScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug, Default)]
struct ManualTimerState {
    active: Option<u64>,
    scheduled: usize,
    cancelled: usize,
    overlapping: usize,
}

/// Timer that never fires on its own; tests deliver ticks by hand.
/// Clones share state so a test can keep a handle after moving one into the tracker.
#[derive(Debug, Default, Clone)]
pub struct ManualTickScheduler {
    state: Rc<RefCell<ManualTimerState>>,
}

impl ManualTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_count(&self) -> usize {
        self.state.borrow().scheduled
    }

    pub fn cancel_count(&self) -> usize {
        self.state.borrow().cancelled
    }

    /// Times `schedule` was called while another timer was still live
    pub fn overlapping_schedules(&self) -> usize {
        self.state.borrow().overlapping
    }
}

impl TickScheduler for ManualTickScheduler {
    fn schedule(&mut self, generation: u64) {
        let mut st = self.state.borrow_mut();
        if st.active.is_some() {
            st.overlapping += 1;
        }
        st.active = Some(generation);
        st.scheduled += 1;
    }

    fn cancel(&mut self) {
        let mut st = self.state.borrow_mut();
        if st.active.take().is_some() {
            st.cancelled += 1;
        }
    }

    fn active_generation(&self) -> Option<u64> {
        self.state.borrow().active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn thread_timer_posts_ticks_with_generation() {
        let (tx, rx) = mpsc::channel();
        let mut timer = ThreadTickScheduler::new(tx, Duration::from_millis(5));
        timer.schedule(3);

        let ev = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(ev, RunEvent::Tick { generation: 3 });
        assert_eq!(timer.active_generation(), Some(3));
    }

    #[test]
    fn rescheduling_cancels_previous_timer() {
        let (tx, rx) = mpsc::channel();
        let mut timer = ThreadTickScheduler::new(tx, Duration::from_millis(5));
        timer.schedule(1);
        timer.schedule(2);

        // let the cancelled sleeper observe its flag
        std::thread::sleep(Duration::from_millis(50));
        timer.cancel();
        std::thread::sleep(Duration::from_millis(20));

        let ticks: Vec<RunEvent> = rx.try_iter().collect();
        let stale_after_switch = ticks
            .iter()
            .skip_while(|e| **e == RunEvent::Tick { generation: 1 })
            .filter(|e| **e == RunEvent::Tick { generation: 1 })
            .count();
        assert_eq!(stale_after_switch, 0);
        assert!(ticks.contains(&RunEvent::Tick { generation: 2 }));
        assert_eq!(timer.active_generation(), None);
    }

    #[test]
    fn cancelled_timer_goes_quiet() {
        let (tx, rx) = mpsc::channel();
        let mut timer = ThreadTickScheduler::new(tx, Duration::from_millis(5));
        timer.schedule(1);
        timer.cancel();
        std::thread::sleep(Duration::from_millis(30));
        // at most one tick can slip out before the flag is observed
        assert!(rx.try_iter().count() <= 1);
    }

    #[test]
    fn manual_timer_tracks_schedule_and_cancel() {
        let handle = ManualTickScheduler::new();
        let mut timer = handle.clone();

        timer.schedule(1);
        timer.cancel();
        timer.cancel();
        timer.schedule(2);

        assert_eq!(handle.active_generation(), Some(2));
        assert_eq!(handle.schedule_count(), 2);
        assert_eq!(handle.cancel_count(), 1);
        assert_eq!(handle.overlapping_schedules(), 0);
    }
}
