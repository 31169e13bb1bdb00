//! Typed failures for engine operations.
//!
//! Every variant corresponds to a request the engine refused *before*
//! mutating anything. Callers relay these to the single initiating client;
//! they are never broadcast to a session group.

use thiserror::Error;

/// Why an engine operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No rule plugin is registered for the requested game type.
    #[error("unknown game type")]
    UnknownGameType,

    /// Session settings failed the selected plugin's bounds checks.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// No live session exists under the given code.
    #[error("session not found")]
    SessionNotFound,

    /// The roster already holds the plugin's maximum player count.
    #[error("session is full")]
    SessionFull,

    /// The session left the lobby; only returning players may rejoin.
    #[error("session already started")]
    AlreadyStarted,

    /// The requester is not the session host.
    #[error("only the host can do that")]
    NotHost,

    /// The roster is below the plugin's minimum player count.
    #[error("not enough players to start")]
    NotEnoughPlayers,

    /// The session is not in the `playing` state.
    #[error("session is not in play")]
    NotPlaying,
}

impl EngineError {
    /// Stable machine-readable reason string, suitable for client dispatch.
    /// The `Display` impl carries the human-readable text.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownGameType => "unknown_game_type",
            Self::InvalidSettings(_) => "invalid_settings",
            Self::SessionNotFound => "session_not_found",
            Self::SessionFull => "session_full",
            Self::AlreadyStarted => "already_started",
            Self::NotHost => "not_host",
            Self::NotEnoughPlayers => "not_enough_players",
            Self::NotPlaying => "not_playing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_strings_are_stable() {
        assert_eq!(EngineError::SessionNotFound.reason(), "session_not_found");
        assert_eq!(
            EngineError::InvalidSettings("rounds".into()).reason(),
            "invalid_settings"
        );
        assert_eq!(EngineError::NotHost.reason(), "not_host");
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(
            EngineError::NotEnoughPlayers.to_string(),
            "not enough players to start"
        );
    }
}
