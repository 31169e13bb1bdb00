//! Wire payloads: client requests, acks and broadcast bodies.
//!
//! Event names and shapes mirror what the mobile and web clients already
//! speak, so field names stay camel-ish snake_case and optional fields are
//! omitted rather than sent as null.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use parlor_engine::{EngineError, GameType, Player, PlayerView, SessionSettings};

// ---------------------------------------------------------------------------
// Client → server requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub game_type: GameType,
    #[serde(default)]
    pub settings: SessionSettings,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub code: String,
    /// Optional display-name override for this session.
    pub player_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub code: String,
    pub action: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub code: String,
    pub target_user_id: Uuid,
    /// What the inviter believes the session is; the relay trusts the
    /// session itself and only logs a mismatch.
    #[serde(default)]
    pub game_type: Option<GameType>,
}

// ---------------------------------------------------------------------------
// Acks and errors (to the initiating caller only)
// ---------------------------------------------------------------------------

/// Machine-readable reason plus human text. Sent only to the socket whose
/// request failed; the rest of the session group never sees it.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub reason: String,
    pub message: String,
}

impl From<&EngineError> for ErrorBody {
    fn from(err: &EngineError) -> Self {
        Self {
            reason: err.reason().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PlayerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: None,
            state: None,
            error: None,
        }
    }

    pub fn with_state(code: &str, state: PlayerView) -> Self {
        Self {
            success: true,
            code: Some(code.to_string()),
            state: Some(state),
            error: None,
        }
    }

    pub fn err(err: &EngineError) -> Self {
        Self {
            success: false,
            code: None,
            state: None,
            error: Some(ErrorBody::from(err)),
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client broadcasts
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PlayerJoined {
    pub player: Player,
    pub player_count: usize,
}

#[derive(Debug, Serialize)]
pub struct PlayerLeft {
    pub player_id: Uuid,
    pub player_count: usize,
}

#[derive(Debug, Serialize)]
pub struct RoundStart {
    pub round: u32,
    pub total_rounds: u32,
    /// Public compartment only; private slots arrive via per-player
    /// `state` pushes.
    pub game_data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_secs: Option<u64>,
}

/// Lightweight refresh after every action.
#[derive(Debug, Serialize)]
pub struct StateUpdate {
    pub game_data: Value,
    pub players: Vec<Player>,
    pub round: u32,
}

#[derive(Debug, Serialize)]
pub struct RoundEnd {
    pub round: u32,
    pub scores: HashMap<Uuid, i32>,
    pub summary: Value,
    pub players: Vec<Player>,
}

#[derive(Debug, Serialize)]
pub struct GameEnded {
    /// Cumulative standings, best first; ties keep join order.
    pub final_scores: Vec<Player>,
    pub winner: Option<Uuid>,
}

/// Delivered to the invitee's personal room, not the session group.
#[derive(Debug, Serialize)]
pub struct InviteNotice {
    pub code: String,
    pub game_type: GameType,
    pub host_name: String,
}
