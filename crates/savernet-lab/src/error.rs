//! Lab error types

use savernet_core::error::{ConfigError, GameError, StateError};
use thiserror::Error;

/// Errors surfaced while loading specs, running experiments, or writing
/// results.
#[derive(Debug, Error)]
pub enum LabError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("invalid experiment spec: {0}")]
    Spec(String),
}

impl From<ConfigError> for LabError {
    fn from(error: ConfigError) -> Self {
        LabError::Game(GameError::from(error))
    }
}

impl From<StateError> for LabError {
    fn from(error: StateError) -> Self {
        LabError::Game(GameError::from(error))
    }
}
