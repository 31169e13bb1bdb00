//! Runtime configuration for the relay server.

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings the relay needs at runtime. Loaded from the application's TOML
/// config by the binary crate and validated there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP + Socket.IO listener binds to.
    pub bind_address: SocketAddr,
    /// How often the idle reaper sweeps the registry.
    pub reaper_interval_secs: u64,
    /// Age after which a non-playing, non-finished session is reaped.
    pub idle_session_secs: u64,
    /// Age after which a finished session is reaped.
    pub finished_session_secs: u64,
    /// How long a finished session stays readable after the final
    /// standings broadcast before the relay removes it.
    pub ended_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".parse().expect("static address"),
            reaper_interval_secs: 60,
            idle_session_secs: 1800,
            finished_session_secs: 120,
            ended_grace_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs)
    }

    pub fn idle_after(&self) -> Duration {
        Duration::from_secs(self.idle_session_secs)
    }

    pub fn finished_after(&self) -> Duration {
        Duration::from_secs(self.finished_session_secs)
    }

    pub fn ended_grace(&self) -> Duration {
        Duration::from_secs(self.ended_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.port(), 3000);
        assert!(config.idle_after() > config.finished_after());
        assert!(config.reaper_interval() >= Duration::from_secs(1));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = ServerConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: ServerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.bind_address, config.bind_address);
        assert_eq!(parsed.ended_grace_secs, config.ended_grace_secs);
    }
}
