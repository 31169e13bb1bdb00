//! Main application entry point for the party-game relay server.
//!
//! Loads configuration, wires up logging, starts the relay and waits for a
//! shutdown signal.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parlor_server::RelayServer;

mod cli;
mod config;
mod signals;

use cli::CliArgs;
use config::{AppConfig, LoggingSettings};

/// Initialize the logging system.
fn setup_logging(settings: &LoggingSettings, force_json: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let registry = tracing_subscriber::registry().with(filter);

    if force_json || settings.json_format {
        registry
            .with(fmt::layer().json().with_file(false).with_line_number(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_ansi(true).with_file(false).with_line_number(false))
            .init();
    }
    Ok(())
}

struct Application {
    config: AppConfig,
    server: Arc<RelayServer>,
}

impl Application {
    async fn new(args: CliArgs) -> anyhow::Result<Self> {
        let mut config = AppConfig::load_from_file(&args.config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))?;

        // CLI overrides beat the file
        if let Some(bind_address) = args.bind_address {
            config.server.bind_address = bind_address;
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("configuration validation failed: {e}"))?;
        setup_logging(&config.logging, config.logging.json_format)?;

        let auth = Arc::new(config.build_auth_backend());
        if config.auth.tokens.is_empty() {
            info!("no static tokens configured; issue tokens at runtime");
        } else {
            info!(count = config.auth.tokens.len(), "seeded static auth tokens");
        }

        let server_config = config
            .to_server_config()
            .map_err(|e| anyhow::anyhow!("invalid server configuration: {e}"))?;
        let server = Arc::new(RelayServer::new(server_config, auth));

        Ok(Self { config, server })
    }

    async fn run(self) -> anyhow::Result<()> {
        info!("🌟 Parlor relay v{}", env!("CARGO_PKG_VERSION"));
        info!("🌐 bind address: {}", self.config.server.bind_address);
        info!(
            "🧹 reaper: every {}s, lobbies idle out after {}s",
            self.config.server.reaper_interval_secs, self.config.server.idle_session_secs
        );

        let server = self.server.clone();
        let server_handle = tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("server error: {e}");
                std::process::exit(1);
            }
        });

        info!("🛑 press Ctrl+C to shut down");
        signals::wait_for_shutdown()
            .await
            .map_err(|e| anyhow::anyhow!("signal handling failed: {e}"))?;

        self.server.shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(5), server_handle)
            .await
            .context("server did not stop in time")?
            .context("server task panicked")?;

        info!("👋 shutdown complete");
        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    match Application::new(args).await {
        Ok(app) => app.run().await,
        Err(e) => {
            eprintln!("failed to start: {e:?}");
            std::process::exit(1);
        }
    }
}
