use chrono::{DateTime, Duration, Local, Months};
use uuid::Uuid;

use crate::session::Session;

/// A finished session as seen by the aggregate views
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSession {
    pub id: Uuid,
    pub date: DateTime<Local>,
    pub distance_km: f64,
    pub duration_secs: u64,
}

impl HistoricalSession {
    pub fn new(date: DateTime<Local>, distance_km: f64, duration_secs: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            distance_km,
            duration_secs,
        }
    }
}

impl From<&Session> for HistoricalSession {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id(),
            date: s.started_at(),
            distance_km: s.distance_km(),
            duration_secs: s.duration_secs(),
        }
    }
}

/// Read-only sequence of past sessions
pub trait HistorySource {
    fn sessions(&self) -> &[HistoricalSession];
}

/// Process-lifetime history; nothing is written to disk
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    sessions: Vec<HistoricalSession>,
}

impl InMemoryHistory {
    pub fn new(sessions: Vec<HistoricalSession>) -> Self {
        Self { sessions }
    }

    /// The built-in sample history, dated relative to `now`
    pub fn seeded(now: DateTime<Local>) -> Self {
        Self::new(seed_sessions(now))
    }

    pub fn record(&mut self, session: &Session) {
        self.sessions.push(HistoricalSession::from(session));
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl HistorySource for InMemoryHistory {
    fn sessions(&self) -> &[HistoricalSession] {
        &self.sessions
    }
}

pub fn seed_sessions(now: DateTime<Local>) -> Vec<HistoricalSession> {
    let month_ago = now
        .checked_sub_months(Months::new(1))
        .unwrap_or(now - Duration::days(30));
    vec![
        HistoricalSession::new(now - Duration::days(1), 5.0, 1800),
        HistoricalSession::new(now - Duration::days(8), 7.2, 2400),
        HistoricalSession::new(month_ago, 10.5, 3600),
    ]
}
