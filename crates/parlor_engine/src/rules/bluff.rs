//! Truth-or-lie bluffing game.
//!
//! Each round shows a prompt with an obscure true answer. Every player
//! writes a decoy answer, then the truth and the decoys are shuffled into
//! one list and everyone picks the answer they believe. Finding the truth
//! pays; fooling opponents with your decoy pays too.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::EngineError;
use crate::rules::{GameData, GameRules, RoundResults, RoundState};
use crate::session::{GameType, Session, SessionSettings};

const MIN_PLAYERS: usize = 2;
const MAX_PLAYERS: usize = 8;
const DEFAULT_ROUNDS: u32 = 8;
const MAX_ROUNDS: u32 = 30;
const MAX_ANSWER_LEN: usize = 120;

const TRUTH_POINTS: i32 = 2;
const FOOLED_POINTS: i32 = 1;

/// Prompt pool: statement with a blank, plus the true answer. Shuffled per
/// session, consumed with wraparound.
const PROMPTS: &[(&str, &str)] = &[
    ("The unit of measurement for the spiciness of chili peppers is the ___ scale.", "scoville"),
    ("A group of flamingos is called a ___.", "flamboyance"),
    ("The fear of long words is called hippopotomonstrosesquippedalio___.", "phobia"),
    ("Honey never spoils because of its low ___ content.", "moisture"),
    ("The dot over a lowercase i is called a ___.", "tittle"),
    ("Octopuses have ___ hearts.", "three"),
    ("The world's largest desert is ___.", "antarctica"),
    ("A jiffy is an actual unit of ___.", "time"),
    ("Bananas are botanically classified as ___.", "berries"),
    ("The inventor of the frisbee was turned into a ___ after he died.", "frisbee"),
    ("Scotland's national animal is the ___.", "unicorn"),
    ("A bolt of lightning is five times hotter than the surface of the ___.", "sun"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BluffPhase {
    /// Everyone writes a decoy answer.
    Bluffing,
    /// Decoys and the truth are out; everyone picks one.
    Choosing,
}

/// One entry in the shuffled answer list. Ownership stays hidden until the
/// reveal.
#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub id: u32,
    pub text: String,
}

/// Broadcast to everyone in the session.
#[derive(Debug, Clone, Serialize)]
pub struct BluffShared {
    pub phase: BluffPhase,
    pub prompt: Option<String>,
    /// Who has handed in a decoy so far.
    pub submitted: Vec<Uuid>,
    /// Empty until the choosing phase opens.
    pub choices: Vec<Choice>,
    /// Who has picked so far.
    pub chosen: Vec<Uuid>,
}

/// Who wrote a given choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceOwner {
    Truth,
    Decoy(Uuid),
}

/// Visible to nobody until `round_results` surfaces it.
#[derive(Debug, Clone)]
pub struct BluffHidden {
    pub deck: Vec<(String, String)>,
    pub truth: String,
    pub owners: HashMap<u32, ChoiceOwner>,
    pub picks: HashMap<Uuid, u32>,
}

/// A player's own decoy, echoed back so their client can render it.
#[derive(Debug, Clone, Serialize)]
pub struct BluffSlot {
    pub decoy: String,
}

type BluffState = RoundState<BluffShared, BluffHidden, BluffSlot>;

pub struct BluffRules;

impl BluffRules {
    pub fn new() -> Self {
        Self
    }

    fn state(session: &Session) -> Option<&BluffState> {
        match &session.data {
            GameData::Bluff(state) => Some(state),
            _ => None,
        }
    }

    fn state_mut(session: &mut Session) -> Option<&mut BluffState> {
        match &mut session.data {
            GameData::Bluff(state) => Some(state),
            _ => None,
        }
    }

    /// Opens the choosing phase: shuffles the truth in among the decoys and
    /// records which id belongs to whom.
    fn open_choices(state: &mut BluffState) {
        let mut entries: Vec<(ChoiceOwner, String)> =
            vec![(ChoiceOwner::Truth, state.hidden.truth.clone())];
        for (player, slot) in &state.per_player {
            entries.push((ChoiceOwner::Decoy(*player), slot.decoy.clone()));
        }
        entries.shuffle(&mut rand::thread_rng());

        state.shared.choices.clear();
        state.hidden.owners.clear();
        for (idx, (owner, text)) in entries.into_iter().enumerate() {
            let id = idx as u32 + 1;
            state.shared.choices.push(Choice { id, text });
            state.hidden.owners.insert(id, owner);
        }
        state.shared.phase = BluffPhase::Choosing;
    }
}

impl Default for BluffRules {
    fn default() -> Self {
        Self::new()
    }
}

impl GameRules for BluffRules {
    fn game_type(&self) -> GameType {
        GameType::Bluff
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

        let mut deck: Vec<(String, String)> = PROMPTS
            .iter()
            .map(|(prompt, truth)| ((*prompt).into(), (*truth).into()))
            .collect();
        deck.shuffle(&mut rand::thread_rng());

        Ok(GameData::Bluff(RoundState {
            shared: BluffShared {
                phase: BluffPhase::Bluffing,
                prompt: None,
                submitted: Vec::new(),
                choices: Vec::new(),
                chosen: Vec::new(),
            },
            hidden: BluffHidden {
                deck,
                truth: String::new(),
                owners: HashMap::new(),
                picks: HashMap::new(),
            },
            per_player: HashMap::new(),
        }))
    }

    fn on_round_start(&self, session: &mut Session) {
        let round = session.round;
        let Some(state) = Self::state_mut(session) else {
            return;
        };
        if state.hidden.deck.is_empty() {
            return;
        }
        let idx = (round.saturating_sub(1) as usize) % state.hidden.deck.len();
        let (prompt, truth) = state.hidden.deck[idx].clone();

        state.shared.phase = BluffPhase::Bluffing;
        state.shared.prompt = Some(prompt);
        state.shared.submitted.clear();
        state.shared.choices.clear();
        state.shared.chosen.clear();
        state.hidden.truth = truth;
        state.hidden.owners.clear();
        state.hidden.picks.clear();
        state.per_player.clear();
    }

    fn handle_action(&self, session: &mut Session, player: Uuid, action: &str, payload: &Value) {
        if session.player(player).is_none() {
            debug!(%player, "action from a non-member");
            return;
        }
        let eligible: Vec<Uuid> = session
            .players
            .iter()
            .filter(|p| p.is_connected)
            .map(|p| p.id)
            .collect();
        let Some(state) = Self::state_mut(session) else {
            return;
        };
        match action {
            "bluff" => {
                if state.shared.phase != BluffPhase::Bluffing
                    || state.per_player.contains_key(&player)
                {
                    debug!(%player, "ignoring repeated or late decoy");
                    return;
                }
                let Some(text) = payload.get("text").and_then(Value::as_str) else {
                    return;
                };
                let text = text.trim();
                if text.is_empty() || text.len() > MAX_ANSWER_LEN {
                    return;
                }
                state.per_player.insert(
                    player,
                    BluffSlot {
                        decoy: text.to_string(),
                    },
                );
                state.shared.submitted.push(player);

                if eligible
                    .iter()
                    .all(|id| state.per_player.contains_key(id))
                {
                    Self::open_choices(state);
                }
            }
            "choose" => {
                if state.shared.phase != BluffPhase::Choosing
                    || state.hidden.picks.contains_key(&player)
                {
                    debug!(%player, "ignoring repeated or early pick");
                    return;
                }
                let Some(choice_id) = payload.get("choice_id").and_then(Value::as_u64) else {
                    return;
                };
                let choice_id = choice_id as u32;
                match state.hidden.owners.get(&choice_id) {
                    None => return,
                    // Voting for your own decoy would be free points.
                    Some(ChoiceOwner::Decoy(owner)) if *owner == player => return,
                    Some(_) => {}
                }
                state.hidden.picks.insert(player, choice_id);
                state.shared.chosen.push(player);
            }
            _ => debug!(action, "unknown bluff action"),
        }
    }

    fn is_round_over(&self, session: &Session) -> bool {
        let Some(state) = Self::state(session) else {
            return false;
        };
        if state.shared.phase != BluffPhase::Choosing {
            return false;
        }
        session
            .players
            .iter()
            .filter(|p| p.is_connected)
            .all(|p| state.hidden.picks.contains_key(&p.id))
    }

    fn round_results(&self, session: &Session) -> RoundResults {
        let mut scores: HashMap<Uuid, i32> = HashMap::new();
        let Some(state) = Self::state(session) else {
            return RoundResults {
                round: session.round,
                scores,
                summary: Value::Null,
            };
        };

        for player in state.hidden.picks.keys() {
            scores.entry(*player).or_insert(0);
        }
        for (picker, choice_id) in &state.hidden.picks {
            match state.hidden.owners.get(choice_id) {
                Some(ChoiceOwner::Truth) => {
                    *scores.entry(*picker).or_insert(0) += TRUTH_POINTS;
                }
                Some(ChoiceOwner::Decoy(author)) => {
                    *scores.entry(*author).or_insert(0) += FOOLED_POINTS;
                }
                None => {}
            }
        }

        let choices_out: Vec<Value> = state
            .shared
            .choices
            .iter()
            .map(|choice| {
                let owner = match state.hidden.owners.get(&choice.id) {
                    Some(ChoiceOwner::Truth) => json!("truth"),
                    Some(ChoiceOwner::Decoy(author)) => json!(author),
                    None => Value::Null,
                };
                let picked_by: Vec<&Uuid> = state
                    .hidden
                    .picks
                    .iter()
                    .filter(|(_, picked)| **picked == choice.id)
                    .map(|(picker, _)| picker)
                    .collect();
                json!({
                    "id": choice.id,
                    "text": choice.text,
                    "owner": owner,
                    "picked_by": picked_by,
                })
            })
            .collect();

        RoundResults {
            round: session.round,
            scores,
            summary: json!({
                "prompt": state.shared.prompt,
                "truth": state.hidden.truth,
                "choices": choices_out,
            }),
        }
    }

    fn is_game_over(&self, session: &Session) -> bool {
        session.round >= session.total_rounds
    }
}
