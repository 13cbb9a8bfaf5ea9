/// One announcement of the pre-run countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum CountdownStep {
    #[strum(to_string = "3")]
    Three,
    #[strum(to_string = "2")]
    Two,
    #[strum(to_string = "1")]
    One,
    #[strum(to_string = "GO")]
    Go,
}

impl CountdownStep {
    pub fn next(self) -> Option<CountdownStep> {
        match self {
            CountdownStep::Three => Some(CountdownStep::Two),
            CountdownStep::Two => Some(CountdownStep::One),
            CountdownStep::One => Some(CountdownStep::Go),
            CountdownStep::Go => None,
        }
    }
}

/// Pre-roll sequence: "3" on creation, then one step per tick until "GO"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    current: CountdownStep,
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            current: CountdownStep::Three,
        }
    }

    pub fn current(&self) -> CountdownStep {
        self.current
    }

    /// Advance one step; returns the new step, or None once "GO" has been shown
    pub fn advance(&mut self) -> Option<CountdownStep> {
        let next = self.current.next()?;
        self.current = next;
        Some(next)
    }

    pub fn is_finished(&self) -> bool {
        self.current == CountdownStep::Go
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_render_as_announced() {
        let labels: Vec<String> = [
            CountdownStep::Three,
            CountdownStep::Two,
            CountdownStep::One,
            CountdownStep::Go,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(labels, vec!["3", "2", "1", "GO"]);
    }

    #[test]
    fn advances_to_go_then_stops() {
        let mut c = Countdown::new();
        assert_eq!(c.current(), CountdownStep::Three);
        assert_eq!(c.advance(), Some(CountdownStep::Two));
        assert_eq!(c.advance(), Some(CountdownStep::One));
        assert!(!c.is_finished());
        assert_eq!(c.advance(), Some(CountdownStep::Go));
        assert!(c.is_finished());
        assert_eq!(c.advance(), None);
    }
}
