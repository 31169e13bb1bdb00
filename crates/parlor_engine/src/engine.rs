//! The session registry and its operations.
//!
//! `GameEngine` is the sole owner of live sessions. Each operation
//! validates first and mutates second, runs synchronously to completion
//! under the registry's entry guard, and hands back an owned snapshot,
//! so transport code can never observe or produce a half-applied
//! transition on a session, and two actions on the same session never
//! interleave.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::code;
use crate::error::EngineError;
use crate::player::{Player, PlayerProfile};
use crate::rules::{RoundResults, RulesRegistry};
use crate::session::{GameType, Session, SessionSettings, SessionStatus};

/// Result of routing one player action through the active rule plugin.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Snapshot taken after the transition (already on the next round if
    /// one started).
    pub session: Session,
    /// A round settled during this call.
    pub round_ended: bool,
    /// The settled round was the last one; the session is now `Finished`.
    pub game_ended: bool,
    /// Present exactly when `round_ended` is true.
    pub results: Option<RoundResults>,
}

pub struct GameEngine {
    sessions: DashMap<String, Session>,
    rules: RulesRegistry,
}

impl GameEngine {
    pub fn new(rules: RulesRegistry) -> Self {
        Self {
            sessions: DashMap::new(),
            rules,
        }
    }

    /// Engine with both built-in games registered.
    pub fn with_standard_rules() -> Self {
        Self::new(RulesRegistry::standard())
    }

    /// Creates a session with the caller as host and seat 0. The join code
    /// is unique among live sessions; collisions are retried while holding
    /// the registry entry, so a code can never be handed out twice.
    pub fn create_session(
        &self,
        game_type: GameType,
        host: PlayerProfile,
        settings: SessionSettings,
    ) -> Result<Session, EngineError> {
        let rules = self
            .rules
            .get(game_type)
            .ok_or(EngineError::UnknownGameType)?;
        let data = rules.create_initial_state(&settings)?;
        let total_rounds = settings.rounds.unwrap_or_else(|| rules.default_rounds());

        let mut session = Session::new(
            String::new(),
            game_type,
            host,
            total_rounds,
            settings.timer_secs,
            data,
        );
        loop {
            let candidate = code::generate();
            match self.sessions.entry(candidate.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    session.code = candidate;
                    let snapshot = session.clone();
                    slot.insert(session);
                    info!(code = %snapshot.code, game_type = ?game_type, "🎲 session created");
                    return Ok(snapshot);
                }
            }
        }
    }

    /// Adds a player to a lobby, or reactivates a returning player.
    ///
    /// A profile whose id already sits in the roster is a reconnect: it
    /// only flips `is_connected` back on (even mid-game) so score and
    /// seat survive transport drops.
    pub fn join_session(
        &self,
        code: &str,
        profile: PlayerProfile,
    ) -> Result<Session, EngineError> {
        let mut entry = self
            .sessions
            .get_mut(code)
            .ok_or(EngineError::SessionNotFound)?;
        let session = entry.value_mut();

        if let Some(existing) = session.player_mut(profile.id) {
            existing.is_connected = true;
            debug!(code, player = %profile.id, "player reconnected");
            return Ok(session.clone());
        }
        if session.status != SessionStatus::Lobby {
            return Err(EngineError::AlreadyStarted);
        }
        let max_players = self
            .rules
            .get(session.game_type)
            .map(|r| r.max_players())
            .unwrap_or(usize::MAX);
        if session.players.len() >= max_players {
            return Err(EngineError::SessionFull);
        }

        session.players.push(Player::from_profile(profile, false));
        session.touch();
        Ok(session.clone())
    }

    /// Moves a lobby into play: round 1 starts and the plugin seeds its
    /// round state. Host-only.
    pub fn start_session(&self, code: &str, requester: Uuid) -> Result<Session, EngineError> {
        let mut entry = self
            .sessions
            .get_mut(code)
            .ok_or(EngineError::SessionNotFound)?;
        let session = entry.value_mut();

        if session.host_id != requester {
            return Err(EngineError::NotHost);
        }
        if session.status != SessionStatus::Lobby {
            return Err(EngineError::AlreadyStarted);
        }
        let rules = self
            .rules
            .get(session.game_type)
            .ok_or(EngineError::UnknownGameType)?;
        if session.players.len() < rules.min_players() {
            return Err(EngineError::NotEnoughPlayers);
        }

        session.status = SessionStatus::Playing;
        session.round = 1;
        rules.on_round_start(session);
        session.touch();
        info!(code, players = session.players.len(), "▶️ session started");
        Ok(session.clone())
    }

    /// Routes a player action to the active plugin and settles the round
    /// if it just completed.
    ///
    /// Settlement happens at most once per round: the transition below
    /// either finishes the session (further actions fail `NotPlaying`) or
    /// re-seeds the next round (the plugin's round-over predicate is false
    /// again), so late duplicate actions cannot double-apply scores.
    pub fn handle_action(
        &self,
        code: &str,
        player: Uuid,
        action: &str,
        payload: &Value,
    ) -> Result<ActionOutcome, EngineError> {
        let mut entry = self
            .sessions
            .get_mut(code)
            .ok_or(EngineError::SessionNotFound)?;
        let session = entry.value_mut();

        if session.status != SessionStatus::Playing {
            return Err(EngineError::NotPlaying);
        }
        let rules = self
            .rules
            .get(session.game_type)
            .ok_or(EngineError::UnknownGameType)?;

        rules.handle_action(session, player, action, payload);

        if !rules.is_round_over(session) {
            return Ok(ActionOutcome {
                session: session.clone(),
                round_ended: false,
                game_ended: false,
                results: None,
            });
        }

        let results = rules.round_results(session);
        for (id, delta) in &results.scores {
            if let Some(seat) = session.player_mut(*id) {
                seat.score += delta;
            }
        }

        if rules.is_game_over(session) {
            session.status = SessionStatus::Finished;
            info!(code, round = session.round, "🏁 game finished");
            return Ok(ActionOutcome {
                session: session.clone(),
                round_ended: true,
                game_ended: true,
                results: Some(results),
            });
        }

        session.round += 1;
        rules.on_round_start(session);
        session.touch();
        Ok(ActionOutcome {
            session: session.clone(),
            round_ended: true,
            game_ended: false,
            results: Some(results),
        })
    }

    /// Marks a player's transport as gone. The seat, score and identity
    /// stay; only an explicit leave-by-reap or session destruction removes
    /// players.
    pub fn player_disconnect(&self, code: &str, player: Uuid) -> Option<Session> {
        let mut entry = self.sessions.get_mut(code)?;
        let session = entry.value_mut();
        if let Some(seat) = session.player_mut(player) {
            seat.is_connected = false;
        }
        Some(session.clone())
    }

    /// Unconditional removal; used by the reaper and the post-game grace
    /// timer. Not a state transition: the session simply ceases to exist.
    pub fn remove_session(&self, code: &str) {
        if self.sessions.remove(code).is_some() {
            info!(code, "🧹 session removed");
        }
    }

    /// Read-only snapshot lookup.
    pub fn get_session(&self, code: &str) -> Option<Session> {
        self.sessions.get(code).map(|entry| entry.clone())
    }

    /// Snapshots of every live session, for the reaper and stats.
    pub fn snapshots(&self) -> Vec<Session> {
        self.sessions.iter().map(|entry| entry.clone()).collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn profile(name: &str) -> PlayerProfile {
        PlayerProfile {
            id: Uuid::new_v4(),
            name: name.into(),
            avatar_url: None,
        }
    }

    fn engine() -> GameEngine {
        GameEngine::with_standard_rules()
    }

    #[test]
    fn live_session_codes_are_pairwise_distinct() {
        let engine = engine();
        let mut codes = HashSet::new();
        for i in 0..50 {
            let session = engine
                .create_session(
                    GameType::Bluff,
                    profile(&format!("host{i}")),
                    SessionSettings::default(),
                )
                .unwrap();
            assert!(codes.insert(session.code.clone()), "code reuse: {}", session.code);
        }
        assert_eq!(engine.session_count(), 50);
    }

    #[test]
    fn unknown_game_type_is_rejected_before_any_mutation() {
        let engine = GameEngine::new(RulesRegistry::new());
        let err = engine
            .create_session(GameType::Spectrum, profile("host"), SessionSettings::default())
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownGameType);
        assert_eq!(engine.session_count(), 0);
    }

    #[test]
    fn out_of_bounds_settings_are_rejected() {
        let engine = engine();
        let err = engine
            .create_session(
                GameType::Bluff,
                profile("host"),
                SessionSettings {
                    rounds: Some(999),
                    timer_secs: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSettings(_)));
    }

    #[test]
    fn join_fails_for_unknown_codes() {
        let engine = engine();
        assert_eq!(
            engine.join_session("ZZZZZZ", profile("p")).unwrap_err(),
            EngineError::SessionNotFound
        );
    }

    #[test]
    fn join_fails_once_the_roster_is_full() {
        let engine = engine();
        let session = engine
            .create_session(GameType::Bluff, profile("host"), SessionSettings::default())
            .unwrap();
        for i in 0..7 {
            engine
                .join_session(&session.code, profile(&format!("p{i}")))
                .unwrap();
        }
        assert_eq!(
            engine
                .join_session(&session.code, profile("straggler"))
                .unwrap_err(),
            EngineError::SessionFull
        );
    }

    #[test]
    fn join_fails_after_start_except_for_returning_players() {
        let engine = engine();
        let host = profile("host");
        let host_id = host.id;
        let session = engine
            .create_session(GameType::Bluff, host, SessionSettings::default())
            .unwrap();
        let other = profile("other");
        let other_id = other.id;
        engine.join_session(&session.code, other).unwrap();
        engine.start_session(&session.code, host_id).unwrap();

        assert_eq!(
            engine
                .join_session(&session.code, profile("late"))
                .unwrap_err(),
            EngineError::AlreadyStarted
        );

        // returning player reconnects instead of erroring
        engine.player_disconnect(&session.code, other_id).unwrap();
        let rejoined = engine
            .join_session(
                &session.code,
                PlayerProfile {
                    id: other_id,
                    name: "other".into(),
                    avatar_url: None,
                },
            )
            .unwrap();
        assert!(rejoined.player(other_id).unwrap().is_connected);
    }

    #[test]
    fn reconnect_preserves_score_and_round() {
        let engine = engine();
        let host = profile("host");
        let host_id = host.id;
        let session = engine
            .create_session(GameType::Bluff, host, SessionSettings::default())
            .unwrap();
        let other = profile("other");
        let other_id = other.id;
        engine.join_session(&session.code, other).unwrap();
        engine.start_session(&session.code, host_id).unwrap();

        // hand the players a score through a real settlement
        engine
            .handle_action(
                &session.code,
                host_id,
                "bluff",
                &serde_json::json!({"text": "decoy-h"}),
            )
            .unwrap();
        engine
            .handle_action(
                &session.code,
                other_id,
                "bluff",
                &serde_json::json!({"text": "decoy-o"}),
            )
            .unwrap();
        let truth_id = {
            let snapshot = engine.get_session(&session.code).unwrap();
            match &snapshot.data {
                crate::rules::GameData::Bluff(state) => *state
                    .hidden
                    .owners
                    .iter()
                    .find(|(_, owner)| {
                        matches!(owner, crate::rules::bluff::ChoiceOwner::Truth)
                    })
                    .unwrap()
                    .0,
                _ => unreachable!(),
            }
        };
        engine
            .handle_action(
                &session.code,
                host_id,
                "choose",
                &serde_json::json!({"choice_id": truth_id}),
            )
            .unwrap();
        let outcome = engine
            .handle_action(
                &session.code,
                other_id,
                "choose",
                &serde_json::json!({"choice_id": truth_id}),
            )
            .unwrap();
        assert!(outcome.round_ended);

        let before = engine.get_session(&session.code).unwrap();
        assert!(before.player(other_id).unwrap().score > 0);
        engine.player_disconnect(&session.code, other_id).unwrap();
        let after = engine
            .join_session(
                &session.code,
                PlayerProfile {
                    id: other_id,
                    name: "other".into(),
                    avatar_url: None,
                },
            )
            .unwrap();
        assert_eq!(after.round, before.round);
        assert_eq!(
            after.player(other_id).unwrap().score,
            before.player(other_id).unwrap().score
        );
        assert!(after.player(other_id).unwrap().is_connected);
    }

    #[test]
    fn start_requires_the_host() {
        let engine = engine();
        let host = profile("host");
        let session = engine
            .create_session(GameType::Bluff, host, SessionSettings::default())
            .unwrap();
        let other = profile("other");
        let other_id = other.id;
        engine.join_session(&session.code, other).unwrap();

        assert_eq!(
            engine.start_session(&session.code, other_id).unwrap_err(),
            EngineError::NotHost
        );
        // the failed request must not have moved the state machine
        assert_eq!(
            engine.get_session(&session.code).unwrap().status,
            SessionStatus::Lobby
        );
    }

    #[test]
    fn start_requires_enough_players() {
        let engine = engine();
        let host = profile("host");
        let host_id = host.id;
        let session = engine
            .create_session(GameType::Spectrum, host, SessionSettings::default())
            .unwrap();
        engine.join_session(&session.code, profile("b")).unwrap();
        // spectrum needs three
        assert_eq!(
            engine.start_session(&session.code, host_id).unwrap_err(),
            EngineError::NotEnoughPlayers
        );
    }

    #[test]
    fn start_twice_is_rejected() {
        let engine = engine();
        let host = profile("host");
        let host_id = host.id;
        let session = engine
            .create_session(GameType::Bluff, host, SessionSettings::default())
            .unwrap();
        engine.join_session(&session.code, profile("b")).unwrap();
        engine.start_session(&session.code, host_id).unwrap();
        assert_eq!(
            engine.start_session(&session.code, host_id).unwrap_err(),
            EngineError::AlreadyStarted
        );
    }

    #[test]
    fn actions_require_a_playing_session() {
        let engine = engine();
        let host = profile("host");
        let host_id = host.id;
        let session = engine
            .create_session(GameType::Bluff, host, SessionSettings::default())
            .unwrap();
        let err = engine
            .handle_action(&session.code, host_id, "bluff", &serde_json::json!({}))
            .unwrap_err();
        assert_eq!(err, EngineError::NotPlaying);
        assert_eq!(
            engine
                .handle_action("NOSUCH", host_id, "bluff", &serde_json::json!({}))
                .unwrap_err(),
            EngineError::SessionNotFound
        );
    }

    #[test]
    fn disconnect_marks_without_removing() {
        let engine = engine();
        let host = profile("host");
        let host_id = host.id;
        let session = engine
            .create_session(GameType::Bluff, host, SessionSettings::default())
            .unwrap();
        let updated = engine.player_disconnect(&session.code, host_id).unwrap();
        assert_eq!(updated.players.len(), 1);
        assert!(!updated.player(host_id).unwrap().is_connected);
        assert!(engine.player_disconnect("NOSUCH", host_id).is_none());
    }

    #[test]
    fn remove_session_makes_the_code_unretrievable() {
        let engine = engine();
        let session = engine
            .create_session(GameType::Bluff, profile("host"), SessionSettings::default())
            .unwrap();
        assert!(engine.get_session(&session.code).is_some());
        engine.remove_session(&session.code);
        assert!(engine.get_session(&session.code).is_none());
    }
}
