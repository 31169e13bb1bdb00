//! Player identity and roster entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and display info handed to the engine by the transport layer
/// when a player creates or joins a session. The `id` is the account id the
/// relay resolved during authentication, so it is stable across reconnects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// A roster entry inside a session.
///
/// Players are appended in join order and never removed on disconnect:
/// `is_connected` tracks live transport presence while score and identity
/// survive until the player explicitly leaves or the session is destroyed.
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    /// Cumulative score; adjusted only when a round settles.
    pub score: i32,
    pub is_host: bool,
    pub is_connected: bool,
}

impl Player {
    pub fn from_profile(profile: PlayerProfile, is_host: bool) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            avatar_url: profile.avatar_url,
            score: 0,
            is_host,
            is_connected: true,
        }
    }
}
