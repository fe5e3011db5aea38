use crossterm::event::KeyCode;

use crate::orchestrator::Command;
use crate::status::{LoopState, ModelStatus, ViewerStatus};

/// Dashboard state: the latest viewer snapshot plus local UI flags.
#[derive(Debug, Default)]
pub struct App {
    pub status: ViewerStatus,
    should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, status: ViewerStatus) {
        self.status = status;
    }

    /// Maps a key press to a viewer command.
    pub fn on_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                Some(Command::Quit)
            }
            KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char(' ') | KeyCode::Enter
                if self.can_toggle() =>
            {
                Some(Command::Toggle)
            }
            _ => None,
        }
    }

    /// The start/stop control is disabled until the model is ready.
    pub fn can_toggle(&self) -> bool {
        self.status.model.is_ready() && self.status.state != LoopState::Requesting
    }

    pub fn is_loading(&self) -> bool {
        self.status.model == ModelStatus::Loading
    }

    pub fn load_failure(&self) -> Option<&str> {
        match &self.status.model {
            ModelStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// `"cell phone"` -> `"Cell phone"`.
pub fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Confidence as a whole percentage for the side panel.
pub fn whole_percent(confidence: f32) -> u16 {
    (confidence * 100.0).round().clamp(0.0, 100.0) as u16
}
