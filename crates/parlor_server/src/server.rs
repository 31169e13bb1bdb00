//! The relay server: axum application plus Socket.IO layer.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use socketioxide::SocketIo;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use parlor_engine::{GameEngine, SessionStatus};

use crate::auth::AuthBackend;
use crate::config::ServerConfig;
use crate::directory::ClientDirectory;
use crate::error::ServerError;
use crate::reaper::{self, ReaperSettings};
use crate::relay::{self, RelayContext};

/// Owns the engine, the client directory and the transport stack.
pub struct RelayServer {
    config: ServerConfig,
    engine: Arc<GameEngine>,
    directory: Arc<ClientDirectory>,
    auth: Arc<dyn AuthBackend>,
    shutdown: broadcast::Sender<()>,
}

impl RelayServer {
    pub fn new(config: ServerConfig, auth: Arc<dyn AuthBackend>) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            config,
            engine: Arc::new(GameEngine::with_standard_rules()),
            directory: Arc::new(ClientDirectory::new()),
            auth,
            shutdown,
        }
    }

    /// The engine handle, mostly for tests and tooling.
    pub fn engine(&self) -> Arc<GameEngine> {
        self.engine.clone()
    }

    /// Signals every long-running task to stop.
    pub fn shutdown(&self) {
        info!("🛑 shutting down relay server");
        let _ = self.shutdown.send(());
    }

    /// Binds the listener and serves until shutdown is signalled.
    pub async fn run(&self) -> Result<(), ServerError> {
        let (socket_layer, io) = SocketIo::new_layer();
        relay::register(
            &io,
            RelayContext {
                engine: self.engine.clone(),
                directory: self.directory.clone(),
                auth: self.auth.clone(),
                io: io.clone(),
                ended_grace: self.config.ended_grace(),
            },
        );

        let reaper_handle = reaper::spawn(
            self.engine.clone(),
            self.directory.clone(),
            ReaperSettings {
                interval: self.config.reaper_interval(),
                idle_after: self.config.idle_after(),
                finished_after: self.config.finished_after(),
            },
            self.shutdown.subscribe(),
        );

        let app = Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/stats", get(stats_handler))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive())
                    .layer(socket_layer),
            )
            .with_state(HttpState {
                engine: self.engine.clone(),
                directory: self.directory.clone(),
            });

        let listener = tokio::net::TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("bind failed: {e}")))?;
        info!("🚀 relay listening on {}", self.config.bind_address);

        let mut shutdown_rx = self.shutdown.subscribe();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await
            .map_err(|e| ServerError::Network(format!("serve failed: {e}")))?;

        reaper_handle.abort();
        info!("✅ relay stopped");
        Ok(())
    }
}

/// Shared state for the plain HTTP handlers.
#[derive(Clone)]
struct HttpState {
    engine: Arc<GameEngine>,
    directory: Arc<ClientDirectory>,
}

async fn root_handler() -> &'static str {
    "Parlor Game Relay"
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

async fn stats_handler(State(state): State<HttpState>) -> Json<serde_json::Value> {
    Json(stats_payload(&state.engine, &state.directory))
}

fn stats_payload(engine: &GameEngine, directory: &ClientDirectory) -> serde_json::Value {
    let snapshots = engine.snapshots();
    let by_status = |status: SessionStatus| snapshots.iter().filter(|s| s.status == status).count();
    serde_json::json!({
        "sessions": snapshots.len(),
        "lobby": by_status(SessionStatus::Lobby),
        "playing": by_status(SessionStatus::Playing),
        "finished": by_status(SessionStatus::Finished),
        "connected_clients": directory.client_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryAuthBackend;
    use parlor_engine::{GameType, PlayerProfile, SessionSettings};
    use uuid::Uuid;

    #[test]
    fn stats_reflect_the_registry() {
        let engine = GameEngine::with_standard_rules();
        let directory = ClientDirectory::new();
        engine
            .create_session(
                GameType::Bluff,
                PlayerProfile {
                    id: Uuid::new_v4(),
                    name: "host".into(),
                    avatar_url: None,
                },
                SessionSettings::default(),
            )
            .unwrap();

        let stats = stats_payload(&engine, &directory);
        assert_eq!(stats["sessions"], 1);
        assert_eq!(stats["lobby"], 1);
        assert_eq!(stats["playing"], 0);
        assert_eq!(stats["connected_clients"], 0);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent_before_run() {
        let server = RelayServer::new(
            ServerConfig::default(),
            Arc::new(MemoryAuthBackend::new()),
        );
        // no subscribers yet: sending must not panic
        server.shutdown();
        server.shutdown();
        assert_eq!(server.engine().session_count(), 0);
    }
}
