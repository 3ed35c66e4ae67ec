//! CLI argument parsing.

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for the bridge.
#[derive(Parser, Debug, Clone)]
#[command(about = "ANT+ sensor to MQTT bridge")]
pub struct BridgeArgs {
    /// Path to configuration file.
    #[arg(short, long, default_value = "ant.json5")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl BridgeArgs {
    /// Parse CLI arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
