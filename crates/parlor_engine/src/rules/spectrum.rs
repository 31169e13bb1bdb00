//! Scale-guessing game.
//!
//! Each round one player (the guide) privately sees a target position on
//! a scale between two opposing concepts ("freezing" … "scorching") and
//! submits a one-line clue. Everyone else then guesses the position.
//! Guessers score by distance tier; the guide scores off how well the
//! group landed, computed only after the guesser deltas are final.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::EngineError;
use crate::rules::{GameData, GameRules, RoundResults, RoundState};
use crate::session::{GameType, Session, SessionSettings};

const MIN_PLAYERS: usize = 3;
const MAX_PLAYERS: usize = 12;
const DEFAULT_ROUNDS: u32 = 10;
const MAX_ROUNDS: u32 = 30;
const MAX_CLUE_LEN: usize = 120;

/// Opposing-concept pairs the guide clues against. Shuffled once per
/// session, consumed with wraparound.
const CARDS: &[(&str, &str)] = &[
    ("freezing", "scorching"),
    ("whisper", "scream"),
    ("ancient", "brand new"),
    ("guilty pleasure", "openly loved"),
    ("underrated", "overrated"),
    ("useless", "essential"),
    ("weekday", "weekend"),
    ("tiny", "enormous"),
    ("terrifying", "adorable"),
    ("cheap", "luxurious"),
    ("forgettable", "iconic"),
    ("slow", "instant"),
    ("salty", "sweet"),
    ("introvert", "extrovert"),
    ("fantasy", "documentary"),
    ("early bird", "night owl"),
];

/// One scale card: the concept at position 0 and the concept at 100.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleCard {
    pub low: String,
    pub high: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumPhase {
    /// Waiting on the guide's clue.
    Clue,
    /// Clue is out; waiting on guesses.
    Guessing,
}

/// Broadcast to everyone in the session.
#[derive(Debug, Clone, Serialize)]
pub struct SpectrumShared {
    pub phase: SpectrumPhase,
    pub card: Option<ScaleCard>,
    pub guide: Option<Uuid>,
    pub clue: Option<String>,
    /// Who has guessed so far; the values stay hidden until the reveal.
    pub answered: Vec<Uuid>,
}

/// Visible to nobody until `round_results` surfaces it.
#[derive(Debug, Clone)]
pub struct SpectrumHidden {
    pub deck: Vec<ScaleCard>,
    pub rounds_overridden: bool,
    pub target: u8,
    pub guesses: HashMap<Uuid, u8>,
}

/// The guide's private slot: the target they are cluing toward.
#[derive(Debug, Clone, Serialize)]
pub struct SpectrumSlot {
    pub target: u8,
}

type SpectrumState = RoundState<SpectrumShared, SpectrumHidden, SpectrumSlot>;

pub struct SpectrumRules;

impl SpectrumRules {
    pub fn new() -> Self {
        Self
    }

    fn state(session: &Session) -> Option<&SpectrumState> {
        match &session.data {
            GameData::Spectrum(state) => Some(state),
            _ => None,
        }
    }

    fn state_mut(session: &mut Session) -> Option<&mut SpectrumState> {
        match &mut session.data {
            GameData::Spectrum(state) => Some(state),
            _ => None,
        }
    }

    /// Distance tier for a single guess.
    fn guess_delta(target: u8, guess: u8) -> i32 {
        match (i32::from(target) - i32::from(guess)).abs() {
            0..=5 => 4,
            6..=10 => 3,
            11..=20 => 2,
            _ => 0,
        }
    }
}

impl Default for SpectrumRules {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRules for SpectrumRules {
    fn game_type(&self) -> GameType {
        GameType::Spectrum
    }

    fn min_players(&self) -> usize {
        MIN_PLAYERS
    }

    fn max_players(&self) -> usize {
        MAX_PLAYERS
    }

    fn default_rounds(&self) -> u32 {
        DEFAULT_ROUNDS
    }

    fn create_initial_state(&self, settings: &SessionSettings) -> Result<GameData, EngineError> {
        if let Some(rounds) = settings.rounds {
            if rounds == 0 || rounds > MAX_ROUNDS {
                return Err(EngineError::InvalidSettings(format!(
                    "rounds must be between 1 and {MAX_ROUNDS}"
                )));
            }
        }
        if let Some(timer) = settings.timer_secs {
            if !(5..=600).contains(&timer) {
                return Err(EngineError::InvalidSettings(
                    "timer must be between 5 and 600 seconds".into(),
                ));
            }
        }

        let mut deck: Vec<ScaleCard> = CARDS
            .iter()
            .map(|(low, high)| ScaleCard {
                low: (*low).into(),
                high: (*high).into(),
            })
            .collect();
        deck.shuffle(&mut rand::thread_rng());

        Ok(GameData::Spectrum(RoundState {
            shared: SpectrumShared {
                phase: SpectrumPhase::Clue,
                card: None,
                guide: None,
                clue: None,
                answered: Vec::new(),
            },
            hidden: SpectrumHidden {
                deck,
                rounds_overridden: settings.rounds.is_some(),
                target: 0,
                guesses: HashMap::new(),
            },
            per_player: HashMap::new(),
        }))
    }

    fn on_round_start(&self, session: &mut Session) {
        let round = session.round;
        let roster: Vec<Uuid> = session.players.iter().map(|p| p.id).collect();
        if roster.is_empty() {
            return;
        }

        // The budget scales with the table so everyone guides twice, unless
        // the creator pinned an explicit round count.
        if round == 1 {
            let overridden = Self::state(session).map(|s| s.hidden.rounds_overridden);
            if overridden == Some(false) {
                session.total_rounds = roster.len() as u32 * 2;
            }
        }

        let Some(state) = Self::state_mut(session) else {
            return;
        };

        let card_idx = (round.saturating_sub(1) as usize) % state.hidden.deck.len();
        let guide = roster[(round.saturating_sub(1) as usize) % roster.len()];
        let target = rand::thread_rng().gen_range(0..=100u8);

        state.shared.phase = SpectrumPhase::Clue;
        state.shared.card = Some(state.hidden.deck[card_idx].clone());
        state.shared.guide = Some(guide);
        state.shared.clue = None;
        state.shared.answered.clear();
        state.hidden.target = target;
        state.hidden.guesses.clear();
        state.per_player.clear();
        state.per_player.insert(guide, SpectrumSlot { target });
    }

    fn handle_action(&self, session: &mut Session, player: Uuid, action: &str, payload: &Value) {
        if session.player(player).is_none() {
            debug!(%player, "action from a non-member");
            return;
        }
        let Some(state) = Self::state_mut(session) else {
            return;
        };
        match action {
            "clue" => {
                if state.shared.phase != SpectrumPhase::Clue
                    || state.shared.guide != Some(player)
                {
                    debug!(%player, "ignoring out-of-turn clue");
                    return;
                }
                let Some(text) = payload.get("text").and_then(Value::as_str) else {
                    return;
                };
                let text = text.trim();
                if text.is_empty() || text.len() > MAX_CLUE_LEN {
                    return;
                }
                state.shared.clue = Some(text.to_string());
                state.shared.phase = SpectrumPhase::Guessing;
            }
            "guess" => {
                if state.shared.phase != SpectrumPhase::Guessing
                    || state.shared.guide == Some(player)
                    || state.hidden.guesses.contains_key(&player)
                {
                    debug!(%player, "ignoring ineligible guess");
                    return;
                }
                let Some(value) = payload.get("value").and_then(Value::as_u64) else {
                    return;
                };
                if value > 100 {
                    return;
                }
                state.hidden.guesses.insert(player, value as u8);
                state.shared.answered.push(player);
            }
            _ => debug!(action, "unknown spectrum action"),
        }
    }

    fn is_round_over(&self, session: &Session) -> bool {
        let Some(state) = Self::state(session) else {
            return false;
        };
        if state.shared.phase != SpectrumPhase::Guessing {
            return false;
        }
        session
            .players
            .iter()
            .filter(|p| p.is_connected && state.shared.guide != Some(p.id))
            .all(|p| state.hidden.guesses.contains_key(&p.id))
    }

    fn round_results(&self, session: &Session) -> RoundResults {
        let mut scores: HashMap<Uuid, i32> = HashMap::new();
        let mut guesses_out = Vec::new();

        let Some(state) = Self::state(session) else {
            return RoundResults {
                round: session.round,
                scores,
                summary: Value::Null,
            };
        };

        let target = state.hidden.target;
        for (player, guess) in &state.hidden.guesses {
            let delta = Self::guess_delta(target, *guess);
            scores.insert(*player, delta);
            guesses_out.push(json!({
                "player": player,
                "value": guess,
                "delta": delta,
            }));
        }

        // Guide delta depends on everyone else's, so it is settled last.
        if let Some(guide) = state.shared.guide {
            let close_guessers = scores.values().filter(|delta| **delta >= 3).count() as i32;
            scores.insert(guide, close_guessers * 2);
        }

        RoundResults {
            round: session.round,
            scores: scores.clone(),
            summary: json!({
                "target": target,
                "card": state.shared.card,
                "clue": state.shared.clue,
                "guide": state.shared.guide,
                "guesses": guesses_out,
            }),
        }
    }

    fn is_game_over(&self, session: &Session) -> bool {
        session.round >= session.total_rounds
    }
}
