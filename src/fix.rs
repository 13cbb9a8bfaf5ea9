use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A single geodetic position sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub accuracy: Option<f64>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            accuracy: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Stand-in fix used for display when position acquisition fails
    pub fn fallback(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, Utc::now())
    }

    /// Finite latitude within +-90 and longitude within +-180
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other` in meters
    pub fn distance_m(&self, other: &Fix) -> f64 {
        haversine_m((self.latitude, self.longitude), (other.latitude, other.longitude))
    }
}

impl From<Fix> for (f64, f64) {
    fn from(f: Fix) -> Self {
        (f.latitude, f.longitude)
    }
}

pub fn haversine_m(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let d_lat = (p2.0 - p1.0).to_radians();
    let d_lon = (p2.1 - p1.1).to_radians();
    let lat1 = p1.0.to_radians();
    let lat2 = p2.0.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Pick the fix to display, falling back to a fixed coordinate
pub fn resolve_position(fix: Option<Fix>, fallback: (f64, f64)) -> Fix {
    fix.unwrap_or_else(|| Fix::fallback(fallback.0, fallback.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_points_are_zero_apart() {
        let a = Fix::new(37.0, 127.0, Utc::now());
        assert_eq!(a.distance_m(&a), 0.0);
    }

    #[test]
    fn thousandth_of_a_degree_latitude() {
        let now = Utc::now();
        let a = Fix::new(37.0, 127.0, now);
        let b = Fix::new(37.001, 127.0, now);
        let d = a.distance_m(&b);
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn one_degree_longitude_on_equator() {
        let d = haversine_m((0.0, 0.0), (0.0, 1.0));
        assert!((d - 111_195.0).abs() < 1.0);
    }

    #[test]
    fn resolve_position_prefers_real_fix() {
        let real = Fix::new(1.0, 2.0, Utc::now()).with_accuracy(5.0);
        assert_eq!(resolve_position(Some(real), (9.0, 9.0)), real);

        let fallback = resolve_position(None, (37.5665, 126.978));
        assert_eq!(fallback.latitude, 37.5665);
        assert_eq!(fallback.longitude, 126.978);
        assert_eq!(fallback.accuracy, None);
    }

    #[test]
    fn rejects_non_finite_and_out_of_range() {
        let now = Utc::now();
        assert!(Fix::new(-90.0, 180.0, now).is_valid());
        assert!(!Fix::new(f64::NAN, 127.0, now).is_valid());
        assert!(!Fix::new(37.0, f64::INFINITY, now).is_valid());
        assert!(!Fix::new(90.5, 0.0, now).is_valid());
        assert!(!Fix::new(0.0, -181.0, now).is_valid());
    }
}
