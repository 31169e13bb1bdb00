//! Per-viewer projection of session state.
//!
//! Every full-state push goes through [`view_for`], once per recipient.
//! Because the game data is partitioned structurally (see
//! [`crate::rules::RoundState`]), a view can only ever contain the shared
//! compartment plus the viewer's own private slot; there is no key list to
//! keep in sync and nothing to scrub.

use serde::Serialize;
use uuid::Uuid;

use crate::player::Player;
use crate::rules::GameDataView;
use crate::session::{GameType, Session, SessionStatus};

/// What one player is allowed to see of a session.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub code: String,
    pub game_type: GameType,
    pub status: SessionStatus,
    pub players: Vec<Player>,
    pub round: u32,
    pub total_rounds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_secs: Option<u64>,
    pub host_id: Uuid,
    pub data: GameDataView,
}

/// Projects `session` down to what `viewer` may see. Must be called per
/// recipient per broadcast; a view computed for one player is never safe to
/// reuse for another.
pub fn view_for(session: &Session, viewer: Uuid) -> PlayerView {
    PlayerView {
        code: session.code.clone(),
        game_type: session.game_type,
        status: session.status,
        players: session.players.clone(),
        round: session.round,
        total_rounds: session.total_rounds,
        timer_secs: session.timer_secs,
        host_id: session.host_id,
        data: session.data.view_for(viewer),
    }
}
