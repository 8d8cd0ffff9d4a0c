use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

/// Publish UniFi wireless station presence to MQTT.
///
/// Polls the controller for associated stations and publishes
/// `<topic>/new/host/<mac>` and `<topic>/delete/host/<mac>` as stations come
/// and go. Queries on `<topic>/get/host/<mac>` are answered on
/// `<topic>/status/host/<mac>`.
///
/// Settings come from environment variables (UNIFI_USER and UNIFI_PASS are
/// required), optionally layered over a TOML file.
#[derive(Debug, Parser)]
#[command(name = "mqtt-unifi", version, about, long_about)]
pub struct Cli {
    /// TOML file with lowercase keys (e.g. `mqtt_url`); environment wins
    #[arg(long, short = 'c', env = "MQTT_UNIFI_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
