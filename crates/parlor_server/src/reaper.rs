//! Idle-session reaping.
//!
//! Sessions are held entirely in memory, so abandoned rooms must be swept
//! or the registry grows forever. The reaper runs on a fixed interval and
//! removes sessions that have sat in the lobby (or on the final scoreboard)
//! past their threshold. Sessions actively `playing` are never reaped by
//! age: a slow table is still a live table, and play is bounded by the
//! round budget anyway.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use parlor_engine::{GameEngine, SessionStatus};

use crate::directory::ClientDirectory;

/// Sweep thresholds.
#[derive(Debug, Clone)]
pub struct ReaperSettings {
    /// Time between sweeps.
    pub interval: Duration,
    /// Age limit for lobby sessions.
    pub idle_after: Duration,
    /// Age limit for finished sessions (the scoreboard cooldown).
    pub finished_after: Duration,
}

/// Spawns the periodic sweep task. It stops when the shutdown channel
/// fires.
pub fn spawn(
    engine: Arc<GameEngine>,
    directory: Arc<ClientDirectory>,
    settings: ReaperSettings,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(settings.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let reaped = sweep(&engine, &directory, &settings);
                    if reaped > 0 {
                        debug!(reaped, "reaper sweep complete");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

/// One sweep pass; returns how many sessions were removed.
pub fn sweep(
    engine: &GameEngine,
    directory: &ClientDirectory,
    settings: &ReaperSettings,
) -> usize {
    // defensive consistency: drop transport mappings whose session the
    // engine no longer knows
    for code in directory.tracked_codes() {
        if engine.get_session(&code).is_none() {
            debug!(code = %code, "pruning stale session mapping");
            directory.forget_session(&code);
        }
    }

    let mut reaped = 0;
    for session in engine.snapshots() {
        let limit = match session.status {
            SessionStatus::Playing => continue,
            SessionStatus::Finished => settings.finished_after,
            SessionStatus::Lobby => settings.idle_after,
        };
        if session.idle_for() >= limit {
            info!(code = %session.code, status = ?session.status, "🧹 reaping idle session");
            engine.remove_session(&session.code);
            directory.forget_session(&session.code);
            reaped += 1;
        }
    }
    reaped
}
