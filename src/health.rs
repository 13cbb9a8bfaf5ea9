use chrono::{DateTime, Utc};
use tracing::debug;

use crate::observable::{Observable, SubscriptionId};
use crate::position::Authorization;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartRateSample {
    pub bpm: f64,
    pub measured_at: DateTime<Utc>,
}

impl HeartRateSample {
    pub fn new(bpm: f64, measured_at: DateTime<Utc>) -> Self {
        Self { bpm, measured_at }
    }
}

/// Latest heart-rate reading, independent of the session lifecycle
#[derive(Debug, Default)]
pub struct HeartRateMonitor {
    latest: Observable<Option<HeartRateSample>>,
    authorization: Observable<Authorization>,
}

impl HeartRateMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_authorization(&mut self, outcome: Authorization) {
        debug!(%outcome, "heart rate authorization");
        self.authorization.set_if_changed(outcome);
    }

    pub fn authorization(&self) -> Authorization {
        *self.authorization.get()
    }

    /// Record a sample; out-of-order samples older than the latest are dropped
    pub fn record(&mut self, sample: HeartRateSample) {
        if let Some(prev) = self.latest.get() {
            if sample.measured_at < prev.measured_at {
                return;
            }
        }
        self.latest.set(Some(sample));
    }

    pub fn latest(&self) -> Option<HeartRateSample> {
        *self.latest.get()
    }

    pub fn latest_display(&self) -> String {
        bpm_display(self.latest())
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&Option<HeartRateSample>) + 'static,
    ) -> SubscriptionId {
        self.latest.subscribe(listener)
    }
}

pub fn bpm_display(sample: Option<HeartRateSample>) -> String {
    match sample {
        Some(s) => format!("{:.0} BPM", s.bpm),
        None => String::from("--- BPM"),
    }
}
