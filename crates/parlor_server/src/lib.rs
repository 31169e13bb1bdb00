//! # Parlor Server - Real-time Game Relay
//!
//! Transport layer for the party-game engine: a Socket.IO endpoint
//! (socketioxide over axum) that authenticates connections, maps sockets to
//! game sessions, forwards player actions into the
//! [`parlor_engine::GameEngine`] and fans results back out to every
//! participant, with each full-state push sanitized per recipient.
//!
//! ## Components
//!
//! * [`relay`] - socket event handlers: create/join/start/action/leave,
//!   plus the invite side-channel to a user's personal room
//! * [`auth`] - handshake bearer-token validation against an
//!   [`auth::AuthBackend`]
//! * [`directory`] - live mapping from player ids to sockets and session
//!   codes
//! * [`reaper`] - periodic sweep that removes abandoned sessions
//! * [`server`] - the axum application wiring it all together, with
//!   `/health` and `/stats` endpoints
//!
//! ## Failure policy
//!
//! Request failures (unknown session, not host, ...) go back to the single
//! initiating socket as a structured ack or `error` emit; the rest of the
//! session group never hears about them. Broadcast fan-out failures are
//! logged per recipient and never abort delivery to the remaining sockets.

pub use auth::{AuthBackend, AuthedUser, MemoryAuthBackend};
pub use config::ServerConfig;
pub use error::ServerError;
pub use server::RelayServer;

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod reaper;
pub mod relay;
pub mod server;
