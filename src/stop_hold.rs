use std::time::{Duration, Instant};

/// Result of releasing the stop control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldOutcome {
    /// Held long enough; the stop should fire
    Confirmed,
    /// Released early; only the warning is shown
    TooShort { held: Duration },
    /// Release without a matching press
    NotPressed,
}

/// Long-press confirmation for stopping a session
#[derive(Debug, Clone)]
pub struct StopHold {
    min_hold: Duration,
    pressed_at: Option<Instant>,
}

impl StopHold {
    pub const DEFAULT_MIN_HOLD: Duration = Duration::from_secs(2);

    pub fn new(min_hold: Duration) -> Self {
        Self {
            min_hold,
            pressed_at: None,
        }
    }

    pub fn min_hold(&self) -> Duration {
        self.min_hold
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }

    pub fn press(&mut self, now: Instant) {
        self.pressed_at = Some(now);
    }

    pub fn release(&mut self, now: Instant) -> HoldOutcome {
        match self.pressed_at.take() {
            None => HoldOutcome::NotPressed,
            Some(at) => {
                let held = now.saturating_duration_since(at);
                if held >= self.min_hold {
                    HoldOutcome::Confirmed
                } else {
                    HoldOutcome::TooShort { held }
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.pressed_at = None;
    }
}

impl Default for StopHold {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_HOLD)
    }
}
