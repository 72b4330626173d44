use std::time::Duration;

const FRAMES: [&str; 8] = ["⣾ ", "⣽ ", "⣻ ", "⢿ ", "⡿ ", "⣟ ", "⣯ ", "⣷ "];

/// Delay between two spinner frames.
pub const SPINNER_INTERVAL: Duration = Duration::from_millis(100);

/// Braille dot spinner shown while a save is in flight.
#[derive(Debug, Clone, Default)]
pub struct Spinner {
    frame: usize,
}

impl Spinner {
    pub fn tick(&mut self) {
        self.frame = (self.frame + 1) % FRAMES.len();
    }

    pub fn reset(&mut self) {
        self.frame = 0;
    }

    pub fn view(&self) -> &'static str {
        FRAMES[self.frame]
    }
}
