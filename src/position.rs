use serde::{Deserialize, Serialize};

/// Outcome of asking the platform for access to a sensor.
/// The core only reports it; prompting again is up to the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
pub enum Authorization {
    Authorized,
    Denied,
    #[default]
    NotDetermined,
}

impl Authorization {
    pub fn is_authorized(self) -> bool {
        self == Authorization::Authorized
    }
}

/// Delivers fixes to the tracker while updates are on.
/// The tracker turns updates on when it enters `Running` and off otherwise.
pub trait PositionProvider {
    fn start_updates(&mut self);
    fn stop_updates(&mut self);
    fn authorization(&self) -> Authorization {
        Authorization::Authorized
    }
}

/// Coordinate shown when no fix is available
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for DefaultPosition {
    fn default() -> Self {
        Self {
            latitude: 37.5665,
            longitude: 126.978,
        }
    }
}

impl From<DefaultPosition> for (f64, f64) {
    fn from(p: DefaultPosition) -> Self {
        (p.latitude, p.longitude)
    }
}

/// Provider that only records whether updates are on; fixes are fed to the
/// tracker directly.
#[derive(Debug, Default, Clone)]
pub struct ManualPositionProvider {
    pub updating: bool,
    pub start_calls: usize,
    pub stop_calls: usize,
    pub authorization: Authorization,
}

impl ManualPositionProvider {
    pub fn authorized() -> Self {
        Self {
            authorization: Authorization::Authorized,
            ..Self::default()
        }
    }
}

impl PositionProvider for ManualPositionProvider {
    fn start_updates(&mut self) {
        self.updating = true;
        self.start_calls += 1;
    }

    fn stop_updates(&mut self) {
        self.updating = false;
        self.stop_calls += 1;
    }

    fn authorization(&self) -> Authorization {
        self.authorization
    }
}
