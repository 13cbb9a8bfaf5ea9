//! Display formatting and aggregate statistics over sessions.
//!
//! Everything here is pure: callers pass in the sessions and, for calendar
//! buckets, the reference "now".

use chrono::{DateTime, Datelike, Local};
use itertools::Itertools;
use std::collections::HashMap;

use crate::history::HistoricalSession;
use crate::session::Session;

/// ISO order, Monday first
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Aggregation granularity for filtering and charting
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Bucket {
    Week,
    Month,
    #[strum(to_string = "All time")]
    AllTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartDatum {
    pub label: String,
    pub value: f64,
}

impl ChartDatum {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

pub fn distance_display(distance_km: f64) -> String {
    format!("{distance_km:.2} km")
}

/// `mm:ss`; minutes keep counting past the hour
pub fn duration_display(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn duration_display_hms(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Minutes:seconds per kilometer, `00:00` before any distance is covered
pub fn pace_display(session: &Session) -> String {
    format_pace(session.pace_secs_per_km().unwrap_or(0.0))
}

pub fn format_pace(secs_per_km: f64) -> String {
    if !secs_per_km.is_finite() || secs_per_km <= 0.0 {
        return String::from("00:00");
    }
    duration_display(secs_per_km as u64)
}

pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

pub fn total_distance(sessions: &[HistoricalSession]) -> f64 {
    sessions.iter().map(|s| s.distance_km).sum()
}

pub fn session_count(sessions: &[HistoricalSession]) -> usize {
    sessions.len()
}

pub fn average_distance(sessions: &[HistoricalSession]) -> f64 {
    let distances: Vec<f64> = sessions.iter().map(|s| s.distance_km).collect();
    mean(&distances).unwrap_or(0.0)
}

/// Mean duration in seconds
pub fn average_duration(sessions: &[HistoricalSession]) -> f64 {
    let durations: Vec<f64> = sessions.iter().map(|s| s.duration_secs as f64).collect();
    mean(&durations).unwrap_or(0.0)
}

/// Total duration over total distance, in seconds per kilometer
pub fn average_pace(sessions: &[HistoricalSession]) -> f64 {
    let distance = total_distance(sessions);
    if distance <= 0.0 {
        return 0.0;
    }
    let duration: u64 = sessions.iter().map(|s| s.duration_secs).sum();
    duration as f64 / distance
}

pub fn average_distance_display(sessions: &[HistoricalSession]) -> String {
    format!("{:.2} KM", average_distance(sessions))
}

pub fn average_duration_display(sessions: &[HistoricalSession]) -> String {
    duration_display(average_duration(sessions) as u64)
}

pub fn average_pace_display(sessions: &[HistoricalSession]) -> String {
    format!("{} min/km", format_pace(average_pace(sessions)))
}

/// Keep the sessions that fall into the same calendar bucket as `now`:
/// ISO week for `Week`, calendar month for `Month`, everything for `AllTime`.
pub fn filter_sessions(
    sessions: &[HistoricalSession],
    bucket: Bucket,
    now: DateTime<Local>,
) -> Vec<HistoricalSession> {
    sessions
        .iter()
        .filter(|s| in_bucket(&s.date, bucket, &now))
        .cloned()
        .collect()
}

fn in_bucket(date: &DateTime<Local>, bucket: Bucket, now: &DateTime<Local>) -> bool {
    match bucket {
        Bucket::Week => date.iso_week() == now.iso_week(),
        Bucket::Month => date.year() == now.year() && date.month() == now.month(),
        Bucket::AllTime => true,
    }
}

/// Distance per weekday (week), day of month (month), or month name (all time).
///
/// The week chart always has seven entries in ISO weekday order (Monday
/// through Sunday, matching the ISO-week filter), with zeros for days
/// without a run. Month and all-time charts only list keys that have
/// at least one session, in calendar order.
pub fn chart_data(
    sessions: &[HistoricalSession],
    bucket: Bucket,
    now: DateTime<Local>,
) -> Vec<ChartDatum> {
    let filtered = filter_sessions(sessions, bucket, now);
    let grouped: HashMap<u32, f64> = filtered
        .iter()
        .map(|s| (group_key(&s.date, bucket), s.distance_km))
        .into_grouping_map()
        .sum();

    match bucket {
        Bucket::Week => WEEKDAY_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| ChartDatum::new(*name, grouped.get(&(i as u32)).copied().unwrap_or(0.0)))
            .collect(),
        Bucket::Month => grouped
            .into_iter()
            .sorted_by_key(|(day, _)| *day)
            .map(|(day, km)| ChartDatum::new(day.to_string(), km))
            .collect(),
        Bucket::AllTime => grouped
            .into_iter()
            .sorted_by_key(|(month0, _)| *month0)
            .map(|(month0, km)| ChartDatum::new(MONTH_NAMES[month0 as usize], km))
            .collect(),
    }
}

fn group_key(date: &DateTime<Local>, bucket: Bucket) -> u32 {
    match bucket {
        Bucket::Week => date.weekday().num_days_from_monday(),
        Bucket::Month => date.day(),
        Bucket::AllTime => date.month0(),
    }
}
