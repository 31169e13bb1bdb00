//! End-to-end engine tests: a full bluffing game from lobby to finish,
//! covering settlement-once semantics, termination at the round budget and
//! final standings order.

use parlor_engine::rules::bluff::ChoiceOwner;
use parlor_engine::{
    GameData, GameEngine, GameType, PlayerProfile, SessionSettings, SessionStatus,
};
use serde_json::json;
use uuid::Uuid;

fn profile(name: &str) -> PlayerProfile {
    PlayerProfile {
        id: Uuid::new_v4(),
        name: name.into(),
        avatar_url: None,
    }
}

/// Choice id owned by the truth in the current round.
fn truth_choice(engine: &GameEngine, code: &str) -> u32 {
    let session = engine.get_session(code).unwrap();
    match &session.data {
        GameData::Bluff(state) => *state
            .hidden
            .owners
            .iter()
            .find(|(_, owner)| matches!(owner, ChoiceOwner::Truth))
            .unwrap()
            .0,
        _ => panic!("not a bluff session"),
    }
}

/// Choice id owned by `author`'s decoy in the current round.
fn decoy_choice(engine: &GameEngine, code: &str, author: Uuid) -> u32 {
    let session = engine.get_session(code).unwrap();
    match &session.data {
        GameData::Bluff(state) => *state
            .hidden
            .owners
            .iter()
            .find(|(_, owner)| matches!(owner, ChoiceOwner::Decoy(id) if *id == author))
            .unwrap()
            .0,
        _ => panic!("not a bluff session"),
    }
}

/// Plays one bluff round: everyone submits a decoy, `truth_finders` pick
/// the truth and everyone else picks the first finder's decoy.
fn play_round(
    engine: &GameEngine,
    code: &str,
    ids: &[Uuid],
    truth_finders: &[Uuid],
) -> parlor_engine::ActionOutcome {
    for (i, id) in ids.iter().enumerate() {
        engine
            .handle_action(code, *id, "bluff", &json!({"text": format!("decoy-{i}")}))
            .unwrap();
    }
    let truth = truth_choice(engine, code);
    let fallback = decoy_choice(engine, code, truth_finders[0]);
    let mut outcome = None;
    for id in ids {
        let pick = if truth_finders.contains(id) {
            truth
        } else {
            fallback
        };
        outcome = Some(
            engine
                .handle_action(code, *id, "choose", &json!({"choice_id": pick}))
                .unwrap(),
        );
    }
    outcome.unwrap()
}

#[test]
fn bluff_game_runs_to_completion_with_sorted_standings() {
    let engine = GameEngine::with_standard_rules();
    let host = profile("host");
    let host_id = host.id;
    let settings = SessionSettings {
        rounds: Some(2),
        timer_secs: None,
    };
    let session = engine
        .create_session(GameType::Bluff, host, settings)
        .unwrap();
    let code = session.code.clone();

    let second = profile("second");
    let second_id = second.id;
    let third = profile("third");
    let third_id = third.id;
    engine.join_session(&code, second).unwrap();
    engine.join_session(&code, third).unwrap();
    engine.start_session(&code, host_id).unwrap();
    let ids = [host_id, second_id, third_id];

    // round 1: host finds the truth, the others fall for host's decoy
    let outcome = play_round(&engine, &code, &ids, &[host_id]);
    assert!(outcome.round_ended);
    assert!(!outcome.game_ended);
    assert_eq!(outcome.session.round, 2);
    let results = outcome.results.unwrap();
    assert_eq!(results.round, 1);
    // truth (2) + two fooled opponents (2 × 1)
    assert_eq!(results.scores[&host_id], 4);

    // round 2 is the budget, so this settlement ends the game
    let outcome = play_round(&engine, &code, &ids, &[host_id, second_id]);
    assert!(outcome.round_ended);
    assert!(outcome.game_ended);
    assert_eq!(outcome.session.status, SessionStatus::Finished);
    assert_eq!(outcome.session.round, 2, "no extra uncounted round");

    // cumulative standings: host 4+2+1, second 0+2, third 0+0
    let standings = outcome.session.standings();
    assert_eq!(standings[0].id, host_id);
    assert_eq!(standings[0].score, 7);
    assert_eq!(standings[1].id, second_id);
    assert_eq!(standings[1].score, 2);
    assert_eq!(standings[2].id, third_id);

    // finished sessions stay retrievable until removal...
    assert!(engine.get_session(&code).is_some());
    // ...but accept no further actions
    assert_eq!(
        engine
            .handle_action(&code, host_id, "bluff", &json!({"text": "late"}))
            .unwrap_err(),
        parlor_engine::EngineError::NotPlaying
    );

    engine.remove_session(&code);
    assert!(engine.get_session(&code).is_none());
}

#[test]
fn settlement_applies_round_deltas_exactly_once() {
    let engine = GameEngine::with_standard_rules();
    let host = profile("host");
    let host_id = host.id;
    let session = engine
        .create_session(GameType::Bluff, host, SessionSettings::default())
        .unwrap();
    let code = session.code.clone();
    let second = profile("second");
    let second_id = second.id;
    engine.join_session(&code, second).unwrap();
    engine.start_session(&code, host_id).unwrap();
    let ids = [host_id, second_id];

    let outcome = play_round(&engine, &code, &ids, &[host_id, second_id]);
    assert!(outcome.round_ended);
    let scores_after_round: Vec<i32> = outcome.session.players.iter().map(|p| p.score).collect();

    // replaying the settled round's action lands in the next round's
    // bluffing phase, where a stale pick is a no-op
    let truth = outcome.results.unwrap();
    let replay = engine
        .handle_action(&code, host_id, "choose", &json!({"choice_id": 1}))
        .unwrap();
    assert!(!replay.round_ended);
    let scores_after_replay: Vec<i32> = replay.session.players.iter().map(|p| p.score).collect();
    assert_eq!(scores_after_round, scores_after_replay);
    assert_eq!(truth.round, 1);
}

#[test]
fn spectrum_round_one_has_one_guide_and_advances_on_last_guess() {
    let engine = GameEngine::with_standard_rules();
    let host = profile("host");
    let host_id = host.id;
    let session = engine
        .create_session(GameType::Spectrum, host, SessionSettings::default())
        .unwrap();
    let code = session.code.clone();
    let b = profile("b");
    let b_id = b.id;
    let c = profile("c");
    let c_id = c.id;
    engine.join_session(&code, b).unwrap();
    engine.join_session(&code, c).unwrap();

    let started = engine.start_session(&code, host_id).unwrap();
    assert_eq!(started.round, 1);
    let guide = match &started.data {
        GameData::Spectrum(state) => state.shared.guide.unwrap(),
        _ => panic!("not a spectrum session"),
    };
    let guessers: Vec<Uuid> = [host_id, b_id, c_id]
        .into_iter()
        .filter(|id| *id != guide)
        .collect();
    assert_eq!(guessers.len(), 2);

    engine
        .handle_action(&code, guide, "clue", &json!({"text": "about there"}))
        .unwrap();
    let first = engine
        .handle_action(&code, guessers[0], "guess", &json!({"value": 40}))
        .unwrap();
    assert!(!first.round_ended);
    let second = engine
        .handle_action(&code, guessers[1], "guess", &json!({"value": 60}))
        .unwrap();
    assert!(second.round_ended);
    assert!(second.results.is_some());
    assert_eq!(second.session.round, 2);
}
