//! Command-line interface for the relay server binary.

use clap::{Arg, Command};
use std::path::PathBuf;

/// Parsed command-line options. Anything set here overrides the
/// configuration file.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file.
    pub config_path: PathBuf,
    /// Optional override for the bind address.
    pub bind_address: Option<String>,
    /// Optional override for the log level.
    pub log_level: Option<String>,
    /// Whether to force JSON log output.
    pub json_logs: bool,
}

impl CliArgs {
    pub fn parse() -> Self {
        let matches = Command::new("Parlor Game Relay")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Real-time party-game session server")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("config.toml"),
            )
            .arg(
                Arg::new("bind")
                    .short('b')
                    .long("bind")
                    .value_name("ADDRESS")
                    .help("Bind address (e.g., 127.0.0.1:3000)"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .get_matches();

        Self {
            config_path: PathBuf::from(
                matches
                    .get_one::<String>("config")
                    .expect("config has a default value"),
            ),
            bind_address: matches.get_one::<String>("bind").cloned(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }
}
