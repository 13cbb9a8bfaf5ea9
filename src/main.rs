use std::{
    error::Error,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use chrono::{Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rand::Rng;
use stride::{
    charting::render_bars,
    config::{ConfigStore, FileConfigStore},
    fix::Fix,
    history::{HistorySource, InMemoryHistory},
    metrics::{self, Bucket},
    position::{DefaultPosition, PositionProvider},
    runtime::{ChannelEventSource, FixedTicker, RunEvent, Runner, Trigger},
    timer::ThreadTickScheduler,
    tracker::{RunTracker, SessionState, TrackerOptions},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CHART_WIDTH: usize = 30;

/// running session tracker with live distance, duration and pace
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Tracks a running session through start, pause, resume and stop, accumulating GPS fixes into distance, duration and pace, and summarizes past sessions by week, month or all time."
)]
pub struct Cli {
    /// config file to use instead of the platform default
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// simulate a run along a synthetic GPS route
    Run {
        /// seconds of running before the session is stopped
        #[clap(short = 's', long, default_value_t = 10)]
        secs: u64,

        /// pause after this many seconds
        #[clap(long)]
        pause_at: Option<u64>,

        /// resume after this many seconds
        #[clap(long, requires = "pause_at")]
        resume_at: Option<u64>,

        /// count down 3-2-1-GO before starting
        #[clap(long)]
        countdown: bool,

        /// timer period in milliseconds (overrides config)
        #[clap(long)]
        tick_ms: Option<u64>,
    },
    /// averages and distance chart for past sessions
    History {
        #[clap(short = 'b', long, value_enum, default_value_t = BucketArg::Week)]
        bucket: BucketArg,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum BucketArg {
    Week,
    Month,
    AllTime,
}

impl From<BucketArg> for Bucket {
    fn from(b: BucketArg) -> Self {
        match b {
            BucketArg::Week => Bucket::Week,
            BucketArg::Month => Bucket::Month,
            BucketArg::AllTime => Bucket::AllTime,
        }
    }
}

/// Synthetic route heading roughly north at jogging speed
struct SimulatedRoute {
    tx: Sender<RunEvent>,
    interval: Duration,
    position: Arc<Mutex<(f64, f64)>>,
    stop: Option<Arc<AtomicBool>>,
}

impl SimulatedRoute {
    // ~2.8 m/s
    const STEP_DEG: f64 = 0.000025;

    fn new(tx: Sender<RunEvent>, interval: Duration, origin: DefaultPosition) -> Self {
        Self {
            tx,
            interval,
            position: Arc::new(Mutex::new(origin.into())),
            stop: None,
        }
    }
}

impl PositionProvider for SimulatedRoute {
    fn start_updates(&mut self) {
        self.stop_updates();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let tx = self.tx.clone();
        let position = Arc::clone(&self.position);
        let interval = self.interval;
        let step = Self::STEP_DEG * interval.as_secs_f64();

        thread::spawn(move || {
            let mut rng = rand::thread_rng();
            loop {
                thread::sleep(interval);
                if flag.load(Ordering::Acquire) {
                    break;
                }
                let (lat, lon) = {
                    let Ok(mut p) = position.lock() else { break };
                    p.0 += step * rng.gen_range(0.8..1.2);
                    p.1 += step * rng.gen_range(-0.2..0.2);
                    *p
                };
                let fix = Fix::new(lat, lon, Utc::now()).with_accuracy(rng.gen_range(3.0..8.0));
                if tx.send(RunEvent::Fix(fix)).is_err() {
                    break;
                }
            }
        });
        self.stop = Some(stop);
    }

    fn stop_updates(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.store(true, Ordering::Release);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = store.load();

    match cli.command {
        Command::Run {
            secs,
            pause_at,
            resume_at,
            countdown,
            tick_ms,
        } => {
            let mut options = TrackerOptions::from(&config);
            options.countdown |= countdown;
            let tick = Duration::from_millis(tick_ms.unwrap_or(config.tick_interval_ms).max(1));
            simulate_run(options, tick, secs, pause_at, resume_at)
        }
        Command::History { bucket } => {
            let history = InMemoryHistory::seeded(Local::now());
            print_history(&history, bucket.into());
            Ok(())
        }
    }
}

fn simulate_run(
    options: TrackerOptions,
    tick: Duration,
    secs: u64,
    pause_at: Option<u64>,
    resume_at: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    let source = ChannelEventSource::new();
    let tx = source.sender();
    let scheduler = ThreadTickScheduler::new(tx.clone(), tick);
    let route = SimulatedRoute::new(tx.clone(), tick, options.default_position);
    let mut tracker = RunTracker::new(scheduler, route, options);

    tracker.subscribe_countdown(|step| {
        if let Some(step) = step {
            println!("{step}");
        }
    });
    tracker.subscribe_state(|state| info!(%state, "state changed"));

    let runner = Runner::new(source, FixedTicker::new(tick));
    tx.send(RunEvent::Trigger(Trigger::StartStop))?;

    let started = Instant::now();
    let mut paused_once = false;
    let mut resumed_once = false;
    let mut stop_sent = false;
    let deadline = run_deadline(tick, secs, resume_at);

    let finished = loop {
        let event = runner.step();
        let was_tick = matches!(event, RunEvent::Tick { .. });
        if let Some(done) = tracker.handle(event) {
            break Some(done);
        }

        let beats = (started.elapsed().as_millis() / tick.as_millis().max(1)) as u64;
        if !paused_once && pause_at.is_some_and(|p| beats >= p) && tracker.state() == SessionState::Running {
            paused_once = true;
            tx.send(RunEvent::Trigger(Trigger::Pause))?;
        }
        if paused_once && !resumed_once && resume_at.is_some_and(|r| beats >= r) {
            resumed_once = true;
            tx.send(RunEvent::Trigger(Trigger::Resume))?;
        }

        if was_tick && tracker.state() == SessionState::Running {
            if let Some(session) = tracker.current_session() {
                println!(
                    "{}  {}  pace {}",
                    metrics::duration_display_hms(session.duration_secs()),
                    metrics::distance_display(session.distance_km()),
                    metrics::pace_display(session)
                );
            }
            if !stop_sent && tracker.elapsed_secs() >= secs {
                stop_sent = true;
                tx.send(RunEvent::Trigger(Trigger::StartStop))?;
            }
        }

        if started.elapsed() > deadline {
            warn!("run did not finish in time, stopping");
            break tracker.stop();
        }
    };

    let Some(session) = finished else {
        println!("no session recorded");
        return Ok(());
    };

    println!();
    println!("Distance  {}", metrics::distance_display(session.distance_km()));
    println!("Time      {}", metrics::duration_display(session.duration_secs()));
    println!("Pace      {} min/km", metrics::pace_display(&session));
    println!("Fixes     {}", session.locations().len());

    let mut history = InMemoryHistory::seeded(Local::now());
    history.record(&session);
    println!();
    print_history(&history, Bucket::Week);
    Ok(())
}

/// Upper bound on the demo's wall time, so a stalled timer cannot hang it
fn run_deadline(tick: Duration, secs: u64, resume_at: Option<u64>) -> Duration {
    let beats = secs.saturating_add(resume_at.unwrap_or(0)).saturating_add(50);
    tick.saturating_mul(u32::try_from(beats).unwrap_or(u32::MAX))
}

fn print_history(history: &impl HistorySource, bucket: Bucket) {
    let now = Local::now();
    let sessions = metrics::filter_sessions(history.sessions(), bucket, now);

    println!("{bucket}");
    println!("  Distance  {}", metrics::average_distance_display(&sessions));
    println!("  Pace      {}", metrics::average_pace_display(&sessions));
    println!("  Time      {}", metrics::average_duration_display(&sessions));
    println!("  Runs      {}", metrics::session_count(&sessions));
    println!();

    let chart = metrics::chart_data(history.sessions(), bucket, now);
    if chart.is_empty() {
        println!("  (no runs)");
    }
    for row in render_bars(&chart, CHART_WIDTH) {
        println!("  {row}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_covers_run_and_resume_delay() {
        let tick = Duration::from_millis(20);
        assert_eq!(run_deadline(tick, 10, None), tick * 60);
        assert_eq!(run_deadline(tick, 10, Some(5)), tick * 65);
    }

    #[test]
    fn deadline_saturates_on_huge_durations() {
        let tick = Duration::from_millis(1);
        assert_eq!(
            run_deadline(tick, u64::from(u32::MAX), None),
            tick * u32::MAX
        );
        assert_eq!(
            run_deadline(Duration::from_secs(u64::MAX), u64::MAX, Some(u64::MAX)),
            Duration::MAX
        );
    }
}
