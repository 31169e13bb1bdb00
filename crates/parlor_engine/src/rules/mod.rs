//! The rule-plugin contract and the registry of built-in games.
//!
//! A rule plugin is pure logic: it owns the meaning of its game's actions
//! and the contents of the session's `data`, while the engine owns the
//! session lifecycle around it. Plugins never perform I/O and never touch
//! the roster beyond reading it.
//!
//! ## Privacy partition
//!
//! Instead of an open key/value bag with naming conventions marking secret
//! entries, each plugin's round state is a [`RoundState`] with three typed
//! compartments:
//!
//! * `shared`: serialized into every view;
//! * `hidden`: serialized into no view, ever; a plugin that wants to
//!   reveal something copies it into a round summary explicitly;
//! * `per_player`: one slot per player id, each serialized only into that
//!   player's own view.
//!
//! The sanitizer is then a structural projection with nothing to forget.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::EngineError;
use crate::session::{GameType, Session, SessionSettings};

pub mod bluff;
pub mod spectrum;

pub use bluff::BluffRules;
pub use spectrum::SpectrumRules;

/// Typed per-plugin state with a structural privacy partition.
#[derive(Debug, Clone)]
pub struct RoundState<Pub, Sec, Priv> {
    pub shared: Pub,
    pub hidden: Sec,
    pub per_player: HashMap<Uuid, Priv>,
}

impl<Pub, Sec, Priv> RoundState<Pub, Sec, Priv>
where
    Pub: Serialize,
    Priv: Serialize,
{
    /// Projects this state down to what `viewer` may see: the shared
    /// compartment plus the viewer's own private slot. `hidden` and every
    /// other player's slot are absent by construction.
    pub fn view_for(&self, viewer: Uuid) -> GameDataView {
        GameDataView {
            public: self.public_view(),
            private: self
                .per_player
                .get(&viewer)
                .map(|slot| serde_json::to_value(slot).unwrap_or(Value::Null)),
        }
    }

    /// The shared compartment alone, for group broadcasts.
    pub fn public_view(&self) -> Value {
        serde_json::to_value(&self.shared).unwrap_or(Value::Null)
    }
}

/// Plugin-owned game state, one variant per registered game type.
#[derive(Debug, Clone)]
pub enum GameData {
    Spectrum(RoundState<spectrum::SpectrumShared, spectrum::SpectrumHidden, spectrum::SpectrumSlot>),
    Bluff(RoundState<bluff::BluffShared, bluff::BluffHidden, bluff::BluffSlot>),
}

impl GameData {
    /// Per-viewer projection; recomputed for every recipient of every push.
    pub fn view_for(&self, viewer: Uuid) -> GameDataView {
        match self {
            GameData::Spectrum(state) => state.view_for(viewer),
            GameData::Bluff(state) => state.view_for(viewer),
        }
    }

    /// Shared-compartment projection for lightweight group events.
    pub fn public_view(&self) -> Value {
        match self {
            GameData::Spectrum(state) => state.public_view(),
            GameData::Bluff(state) => state.public_view(),
        }
    }
}

/// What one player is allowed to see of a session's game data.
#[derive(Debug, Clone, Serialize)]
pub struct GameDataView {
    pub public: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<Value>,
}

/// Outcome of settling one round. `scores` holds per-round deltas, not
/// cumulative totals; `summary` is the reveal, the one place hidden round
/// data becomes public.
#[derive(Debug, Clone, Serialize)]
pub struct RoundResults {
    pub round: u32,
    pub scores: HashMap<Uuid, i32>,
    pub summary: Value,
}

/// The contract every game type implements.
///
/// `handle_action` must absorb invalid input silently: wrong phase, wrong
/// role, malformed payload and re-submission all leave the session exactly
/// as it was. The engine phase-gates settlement, so `round_results` is
/// invoked at most once per round boundary.
pub trait GameRules: Send + Sync {
    fn game_type(&self) -> GameType;
    fn min_players(&self) -> usize;
    fn max_players(&self) -> usize;
    /// Round budget when the creator did not pick one. Plugins may still
    /// recompute the budget from the roster at round 1.
    fn default_rounds(&self) -> u32;

    /// Builds the initial `data` for a fresh session, including any
    /// shuffled content pools. Fails only on out-of-bounds settings.
    fn create_initial_state(&self, settings: &SessionSettings) -> Result<GameData, EngineError>;

    /// Seeds per-round state: picks the round's content with wraparound
    /// over the shuffled pool, rotates role assignment, resets answer
    /// collections and writes role secrets into the private compartment.
    fn on_round_start(&self, session: &mut Session);

    /// Applies one player action, or does nothing if the action is not
    /// permitted in the current phase.
    fn handle_action(&self, session: &mut Session, player: Uuid, action: &str, payload: &Value);

    /// True once every eligible *connected* player who must respond has
    /// responded.
    fn is_round_over(&self, session: &Session) -> bool;

    /// Settles the current round. Role scores that depend on other
    /// players' performance are computed only after those are final.
    fn round_results(&self, session: &Session) -> RoundResults;

    /// True when the round budget is exhausted (`round >= total_rounds`).
    fn is_game_over(&self, session: &Session) -> bool;
}

/// Lookup table from game type to rule plugin.
#[derive(Default)]
pub struct RulesRegistry {
    rules: HashMap<GameType, Arc<dyn GameRules>>,
}

impl RulesRegistry {
    /// An empty registry; every `create_session` against it fails with
    /// `UnknownGameType`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with both built-in games wired up.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SpectrumRules::new()));
        registry.register(Arc::new(BluffRules::new()));
        registry
    }

    pub fn register(&mut self, rules: Arc<dyn GameRules>) {
        self.rules.insert(rules.game_type(), rules);
    }

    pub fn get(&self, game_type: GameType) -> Option<Arc<dyn GameRules>> {
        self.rules.get(&game_type).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_covers_every_game_type() {
        let registry = RulesRegistry::standard();
        for game_type in [GameType::Spectrum, GameType::Bluff] {
            let rules = registry.get(game_type).expect("missing plugin");
            assert_eq!(rules.game_type(), game_type);
            assert!(rules.min_players() >= 2);
            assert!(rules.max_players() > rules.min_players());
        }
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = RulesRegistry::new();
        assert!(registry.get(GameType::Spectrum).is_none());
    }
}
