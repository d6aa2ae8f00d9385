use crate::session::{GameState, InputEvent};

/// Keyboard-like input, drained without blocking at the top of every tick
pub trait InputSource {
    fn poll(&mut self, state: GameState) -> Vec<InputEvent>;
}

/// Headless player for recorded runs: confirms calibration, types the
/// configured initials when asked and quits once the leaderboard is shown
#[derive(Debug, Clone)]
pub struct AutoPilot {
    name: String,
    typed: bool,
}

impl AutoPilot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typed: false,
        }
    }
}

impl InputSource for AutoPilot {
    fn poll(&mut self, state: GameState) -> Vec<InputEvent> {
        match state {
            GameState::Calibrate => vec![InputEvent::Confirm],
            GameState::InputName if !self.typed => {
                self.typed = true;
                self.name
                    .chars()
                    .map(InputEvent::Char)
                    .chain(std::iter::once(InputEvent::Confirm))
                    .collect()
            }
            GameState::ShowLeaderboard => vec![InputEvent::Quit],
            _ => Vec::new(),
        }
    }
}
