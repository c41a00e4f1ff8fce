//! Error kinds for the simulation core
//!
//! None of these reach the player mid-session: callers degrade (skip a spawn,
//! fall back to an empty wallet, log a failed save) instead of aborting.

use thiserror::Error;

use crate::persistence::PersistenceError;

#[derive(Debug, Error)]
pub enum GameError {
    /// A coin layout is missing or is not a valid structure
    #[error("coin layout {layout} unavailable: {reason}")]
    DataLoad { layout: usize, reason: String },

    /// Wallet storage failed
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Tuning file unreadable or malformed
    #[error("invalid tuning: {0}")]
    Config(String),

    /// Internal invariant broken (negative speed, duplicate entity id, ...)
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Report an invariant violation.
///
/// Panics in debug builds; in release builds the error is logged and the
/// caller is expected to clamp or ignore the offending value.
#[track_caller]
pub(crate) fn invariant(message: impl Into<String>) -> GameError {
    let err = GameError::Invariant(message.into());
    if cfg!(debug_assertions) {
        panic!("{err}");
    }
    log::error!("{err}");
    err
}
