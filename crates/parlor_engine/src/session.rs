//! The session data model and its state machine.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::player::{Player, PlayerProfile};
use crate::rules::GameData;

/// Which rule plugin governs a session. Adding a game means adding a
/// variant here, which makes every dispatch site non-exhaustive until it
/// handles the new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    /// Scale-guessing game: one guide, a secret position, everyone guesses.
    Spectrum,
    /// Bluffing game: decoy answers compete with the truth.
    Bluff,
}

/// Session lifecycle. `Finished` is terminal: a finished session is inert
/// until the reaper or the post-game grace timer removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Lobby,
    Playing,
    Finished,
}

/// Creator-supplied knobs, validated by the selected rule plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Explicit round budget. When absent, the plugin's default applies and
    /// the plugin may recompute the budget from the roster size at round 1.
    pub rounds: Option<u32>,
    /// Advisory per-round deadline shown by clients; not enforced here.
    pub timer_secs: Option<u64>,
}

/// One live game session ("room").
///
/// Sessions live in the engine's registry and are only ever handed out as
/// owned snapshots. `data` is mutated exclusively through engine-invoked
/// plugin callbacks.
#[derive(Debug, Clone)]
pub struct Session {
    /// Human-shareable join code, unique for the session's whole lifetime.
    pub code: String,
    pub game_type: GameType,
    pub status: SessionStatus,
    /// Insertion-ordered roster; join order doubles as turn rotation order
    /// and as the tie-break for final standings.
    pub players: Vec<Player>,
    /// 1-based once play starts; 0 while in the lobby.
    pub round: u32,
    pub total_rounds: u32,
    pub data: GameData,
    pub timer_secs: Option<u64>,
    pub host_id: Uuid,
    /// Stamped at creation, join, start and every round transition; the
    /// idle reaper reads this as a liveness proxy.
    pub round_started_at: Instant,
}

impl Session {
    pub(crate) fn new(
        code: String,
        game_type: GameType,
        host: PlayerProfile,
        total_rounds: u32,
        timer_secs: Option<u64>,
        data: GameData,
    ) -> Self {
        let host_id = host.id;
        Self {
            code,
            game_type,
            status: SessionStatus::Lobby,
            players: vec![Player::from_profile(host, true)],
            round: 0,
            total_rounds,
            data,
            timer_secs,
            host_id,
            round_started_at: Instant::now(),
        }
    }

    pub fn player(&self, id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: Uuid) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Number of players with a live transport connection.
    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_connected).count()
    }

    /// Marks activity for the idle reaper.
    pub(crate) fn touch(&mut self) {
        self.round_started_at = Instant::now();
    }

    /// How long since the last round transition (or lobby activity).
    pub fn idle_for(&self) -> Duration {
        self.round_started_at.elapsed()
    }

    /// Final standings: cumulative score descending, ties broken by join
    /// order. The sort is stable, so equal scores keep roster order.
    pub fn standings(&self) -> Vec<Player> {
        let mut standings = self.players.clone();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        standings
    }
}
