//! Configuration and CLI argument handling

use std::path::PathBuf;
use clap::Parser;

/// Sound played when a timer finishes, if present on the system
pub const DEFAULT_SOUND: &str = "/usr/share/sounds/freedesktop/stereo/complete.oga";

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "meintimer")]
#[command(about = "A multi-timer server with looping countdowns and notifications")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the saved timers (defaults to the platform data dir)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Sound file played on completion and loop cycles
    #[arg(long, default_value = DEFAULT_SOUND)]
    pub sound: PathBuf,

    /// Command used to play the sound file
    #[arg(long, default_value = "paplay")]
    pub player: String,

    /// Disable notification sounds
    #[arg(short, long)]
    pub mute: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Data directory: the explicit flag, else `<data dir>/meintimer`, else `.`
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("meintimer"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
