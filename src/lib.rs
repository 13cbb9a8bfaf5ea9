// Library surface for the binary and the integration tests.
pub mod app_dirs;
pub mod charting;
pub mod config;
pub mod countdown;
pub mod error;
pub mod fix;
pub mod health;
pub mod history;
pub mod metrics;
pub mod observable;
pub mod position;
pub mod runtime;
pub mod session;
pub mod stop_hold;
pub mod store;
pub mod timer;
pub mod tracker;

pub use fix::Fix;
pub use session::Session;
pub use store::SessionStore;
pub use tracker::{RunTracker, SessionState, TrackerOptions};
