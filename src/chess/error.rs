use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::rules::RulesError;

/// Failures that abort a pipeline invocation.
///
/// Per-game problems (unparsable movetext, illegal moves) never surface here;
/// they are logged and the game is skipped or cut short.
#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read games from '{path}': {message}")]
    Input { path: PathBuf, message: String },
    #[error(transparent)]
    Rules(#[from] RulesError),
}

impl From<toml::de::Error> for PuzzleError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator(Option<String>);

impl ErrorAccumulator {
    pub fn push(&mut self, msg: &str) {
        match &mut self.0 {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(msg);
            }
            None => {
                self.0 = Some(msg.to_string());
            }
        }
    }

    pub fn take(&mut self) -> Option<String> {
        self.0.take()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}
