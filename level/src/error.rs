//! Error types surfaced by level orchestration.

use bastion_core::NotifyError;
use bastion_system_economy::EconomyError;
use bastion_world::WorldError;
use thiserror::Error;

/// Convenient result alias for level operations.
pub type Result<T> = std::result::Result<T, LevelError>;

/// Errors raised while loading or running a level.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The world rejected an operation.
    #[error(transparent)]
    World(#[from] WorldError),
    /// The resource manager rejected an operation.
    #[error(transparent)]
    Economy(#[from] EconomyError),
    /// A listener could not be unregistered.
    #[error(transparent)]
    Notify(#[from] NotifyError),
    /// Level data is structurally unusable.
    #[error("invalid level data: {0}")]
    InvalidLevelData(String),
    /// Level data could not be parsed.
    #[error("failed to parse level data")]
    Config(#[from] toml::de::Error),
    /// `start` was called on a level that already started.
    #[error("level already started")]
    AlreadyStarted,
    /// The level has not been started yet.
    #[error("level has not started")]
    NotStarted,
    /// The level already ended.
    #[error("level is over")]
    Finished,
}

impl LevelError {
    /// True if the error reports a broken invariant rather than a rejected
    /// request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::World(error) if error.is_fatal())
    }
}
