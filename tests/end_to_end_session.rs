use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use stride::history::{HistorySource, InMemoryHistory};
use stride::metrics::{self, Bucket};
use stride::position::ManualPositionProvider;
use stride::runtime::{ChannelEventSource, FixedTicker, RunEvent, Runner, Trigger};
use stride::timer::{ManualTickScheduler, TickScheduler};
use stride::{Fix, RunTracker, SessionState, TrackerOptions};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-08-23T07:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

// start, two fixes ~0.111 km apart, ten ticks, stop
#[test]
fn example_run_accumulates_distance_and_duration() {
    let timer = ManualTickScheduler::new();
    let mut tracker = RunTracker::new(
        timer.clone(),
        ManualPositionProvider::authorized(),
        TrackerOptions::default(),
    );

    tracker.start();
    tracker.on_fix(Fix::new(37.0, 127.0, t0()));
    tracker.on_fix(Fix::new(37.001, 127.0, t0() + ChronoDuration::seconds(10)));
    for _ in 0..10 {
        let g = timer.active_generation().expect("timer running");
        tracker.on_tick(g);
    }

    let session = tracker.current_session().unwrap();
    assert!((session.distance_km() - 0.111).abs() < 0.001);
    assert_eq!(session.duration_secs(), 10);
    assert_eq!(tracker.elapsed_secs(), 10);
    assert_eq!(metrics::distance_display(session.distance_km()), "0.11 km");

    let finished = tracker.stop().unwrap();
    assert_eq!(finished.duration_secs(), 10);
    assert!(tracker.current_session().is_none());
    assert!(!tracker.store().is_running());
    assert_eq!(tracker.elapsed_secs(), 0);
}

#[test]
fn events_through_runner_drive_the_tracker() {
    let timer = ManualTickScheduler::new();
    let mut tracker = RunTracker::new(
        timer.clone(),
        ManualPositionProvider::authorized(),
        TrackerOptions::default(),
    );
    let source = ChannelEventSource::new();
    let tx = source.sender();
    let runner = Runner::new(source, FixedTicker::new(Duration::from_millis(5)));

    let running: Rc<RefCell<Vec<bool>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&running);
    tracker.subscribe_running(move |r| sink.borrow_mut().push(*r));

    tx.send(RunEvent::Trigger(Trigger::StartStop)).unwrap();
    tracker.handle(runner.step());
    assert_eq!(tracker.state(), SessionState::Running);

    let g = timer.active_generation().unwrap();
    tx.send(RunEvent::Fix(Fix::new(37.0, 127.0, t0()))).unwrap();
    tx.send(RunEvent::Tick { generation: g }).unwrap();
    tx.send(RunEvent::Fix(Fix::new(37.001, 127.0, t0()))).unwrap();
    tx.send(RunEvent::Trigger(Trigger::Pause)).unwrap();
    // arrives after pause: must not count
    tx.send(RunEvent::Fix(Fix::new(37.002, 127.0, t0()))).unwrap();
    tx.send(RunEvent::Tick { generation: g }).unwrap();
    tx.send(RunEvent::PositionUnavailable).unwrap();
    for _ in 0..7 {
        tracker.handle(runner.step());
    }

    assert_eq!(tracker.state(), SessionState::Paused);
    let session = tracker.current_session().unwrap();
    assert_eq!(session.locations().len(), 2);
    assert_eq!(session.duration_secs(), 1);
    let paused_distance = session.distance_km();

    tx.send(RunEvent::Trigger(Trigger::StartStop)).unwrap();
    let finished = tracker.handle(runner.step()).unwrap();
    assert_eq!(finished.distance_km(), paused_distance);

    assert_eq!(*running.borrow(), vec![false, true, false]);
    assert!(matches!(runner.step(), RunEvent::Idle));
}

#[test]
fn finished_run_shows_up_in_weekly_chart() {
    let timer = ManualTickScheduler::new();
    let mut tracker = RunTracker::new(
        timer.clone(),
        ManualPositionProvider::authorized(),
        TrackerOptions::default(),
    );
    tracker.toggle();
    tracker.on_fix(Fix::new(37.0, 127.0, t0()));
    tracker.on_fix(Fix::new(37.01, 127.0, t0()));
    let finished = tracker.toggle().unwrap();

    let now = finished.started_at();
    let mut history = InMemoryHistory::default();
    history.record(&finished);

    let chart = metrics::chart_data(history.sessions(), Bucket::Week, now);
    assert_eq!(chart.len(), 7);
    let total: f64 = chart.iter().map(|c| c.value).sum();
    assert!((total - finished.distance_km()).abs() < 1e-9);
    assert!((metrics::average_distance(history.sessions()) - finished.distance_km()).abs() < 1e-9);
}
