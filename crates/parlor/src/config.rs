//! Application configuration loaded from a TOML file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use parlor_server::auth::{AuthedUser, MemoryAuthBackend};
use parlor_server::ServerConfig;

/// Top-level configuration file layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address for the HTTP + Socket.IO listener.
    pub bind_address: String,
    /// Seconds between reaper sweeps.
    pub reaper_interval_secs: u64,
    /// Seconds a lobby may idle before it is reaped.
    pub idle_session_secs: u64,
    /// Seconds a finished session keeps its scoreboard readable.
    pub finished_session_secs: u64,
    /// Seconds between the final standings broadcast and session removal.
    pub ended_grace_secs: u64,
}

/// Development token store. Production deployments front the relay with a
/// real login flow and issue tokens into the backend at runtime instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub tokens: Vec<StaticToken>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub name: String,
    /// Stable account id; generated at load when omitted.
    pub id: Option<Uuid>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter.
    pub level: String,
    /// JSON formatting.
    pub json_format: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                bind_address: "0.0.0.0:3000".to_string(),
                reaper_interval_secs: 60,
                idle_session_secs: 1800,
                finished_session_secs: 120,
                ended_grace_secs: 30,
            },
            auth: AuthSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, writing a default file first if
    /// none exists.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self
            .server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(format!("invalid bind address: {}", self.server.bind_address));
        }
        if self.server.reaper_interval_secs == 0 {
            return Err("reaper_interval_secs must be greater than 0".to_string());
        }
        if self.server.idle_session_secs == 0 {
            return Err("idle_session_secs must be greater than 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "invalid log level: {}. must be one of: {:?}",
                self.logging.level, valid_levels
            ));
        }
        Ok(())
    }

    /// Converts the file layout into the server crate's runtime config.
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.server.bind_address.parse()?,
            reaper_interval_secs: self.server.reaper_interval_secs,
            idle_session_secs: self.server.idle_session_secs,
            finished_session_secs: self.server.finished_session_secs,
            ended_grace_secs: self.server.ended_grace_secs,
        })
    }

    /// Seeds the in-memory token store from the `[auth]` section.
    pub fn build_auth_backend(&self) -> MemoryAuthBackend {
        let backend = MemoryAuthBackend::new();
        for entry in &self.auth.tokens {
            backend.issue(
                entry.token.clone(),
                AuthedUser {
                    id: entry.id.unwrap_or_else(Uuid::new_v4),
                    name: entry.name.clone(),
                    avatar_url: entry.avatar_url.clone(),
                },
            );
        }
        backend
    }
}
