use chrono::{DateTime, Local};
use itertools::Itertools;
use uuid::Uuid;

use crate::fix::Fix;

/// One running activity from start to stop
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Local>,
    locations: Vec<Fix>,
    distance_km: f64,
    duration_secs: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4(), Local::now())
    }

    pub fn with_id(id: Uuid, started_at: DateTime<Local>) -> Self {
        Self {
            id,
            started_at,
            locations: Vec::new(),
            distance_km: 0.0,
            duration_secs: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn locations(&self) -> &[Fix] {
        &self.locations
    }

    pub fn last_location(&self) -> Option<&Fix> {
        self.locations.last()
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Append a fix and add the leg from the previous fix to the distance.
    /// The first fix contributes nothing. Malformed fixes are kept in the
    /// list but add no distance and never serve as the start of a leg.
    pub fn append_location(&mut self, fix: Fix) {
        if fix.is_valid() {
            if let Some(prev) = self.last_valid_location() {
                self.distance_km += prev.distance_m(&fix) / 1000.0;
            }
        }
        self.locations.push(fix);
    }

    fn last_valid_location(&self) -> Option<&Fix> {
        self.locations.iter().rev().find(|f| f.is_valid())
    }

    pub fn tick(&mut self, elapsed_secs: u64) {
        self.duration_secs += elapsed_secs;
    }

    pub(crate) fn set_duration_secs(&mut self, secs: u64) {
        self.duration_secs = secs;
    }

    /// Recompute the distance from the full location list
    pub fn replay_distance_km(&self) -> f64 {
        self.locations
            .iter()
            .filter(|f| f.is_valid())
            .tuple_windows()
            .map(|(a, b)| a.distance_m(b) / 1000.0)
            .sum()
    }

    /// Seconds per kilometer, `None` until some distance is covered
    pub fn pace_secs_per_km(&self) -> Option<f64> {
        if self.distance_km > 0.0 {
            Some(self.duration_secs as f64 / self.distance_km)
        } else {
            None
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
