//! # Parlor Engine - Party-Game Session Core
//!
//! In-memory engine for real-time party games. This crate owns the canonical
//! registry of active game sessions and everything needed to run one: the
//! session/player data model, the state machine (`lobby` → `playing` →
//! `finished`), the [`GameRules`] plugin contract with the built-in rule
//! sets, and the per-viewer state sanitizer.
//!
//! ## Design
//!
//! The engine contains no transport code. A relay layer (see the
//! `parlor_server` crate) translates socket events into engine calls and
//! fans the results back out. Three rules keep that split sound:
//!
//! * The session registry is owned exclusively by [`GameEngine`]; every
//!   other component goes through its public operations and receives owned
//!   snapshots, never references into the registry.
//! * Engine and plugin logic is synchronous and CPU-only. Each operation on
//!   a session runs to completion under the registry's entry guard, so two
//!   actions on the same session can never interleave their reads and
//!   writes.
//! * Game state is partitioned structurally for privacy: every plugin's
//!   round state separates what all players see, what no player sees, and
//!   what exactly one player sees. Views are projected per recipient by the
//!   [`sanitize`] module.
//!
//! ## Validation layers
//!
//! Engine-level request errors (unknown game type, session full, not host,
//! ...) are typed [`EngineError`]s returned to the caller before any state
//! is touched. Malformed or out-of-turn *actions* are absorbed inside the
//! rule plugins as silent no-ops, so a buggy or hostile client can stall at
//! most its own progress and never crash a session.

pub use engine::{ActionOutcome, GameEngine};
pub use error::EngineError;
pub use player::{Player, PlayerProfile};
pub use rules::{GameData, GameDataView, GameRules, RoundResults, RulesRegistry};
pub use sanitize::{view_for, PlayerView};
pub use session::{GameType, Session, SessionSettings, SessionStatus};

pub mod code;
pub mod engine;
pub mod error;
pub mod player;
pub mod rules;
pub mod sanitize;
pub mod session;
