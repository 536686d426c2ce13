//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "yrtimer")]
#[command(about = "A state-managed countdown timer daemon with repeat notifications")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20661")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Directory for persisted timer state (defaults to the user data directory)
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Directory whose sounds/ subdirectory holds custom completion sounds
    #[arg(long)]
    pub sound_dir: Option<PathBuf>,

    /// Start a countdown immediately, e.g. "10m", "01:30" or "90"
    #[arg(short, long)]
    pub start: Option<String>,

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

    /// Get the appropriate log level based on the verbose flag and the
    /// persisted debug setting
    pub fn log_level(&self, debug_setting: bool) -> &'static str {
        if self.verbose || debug_setting {
            "debug"
        } else {
            "info"
        }
    }

    /// Effective settings file path
    pub fn settings_path(&self) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(|| project_dir(ProjectKind::Config).join("settings.json"))
    }

    /// Effective persisted last-state file path
    pub fn state_file(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| project_dir(ProjectKind::Data))
            .join("last-state.json")
    }
}

enum ProjectKind {
    Config,
    Data,
}

fn project_dir(kind: ProjectKind) -> PathBuf {
    match ProjectDirs::from("", "", "yrtimer") {
        Some(dirs) => match kind {
            ProjectKind::Config => dirs.config_dir().to_path_buf(),
            ProjectKind::Data => dirs.data_local_dir().to_path_buf(),
        },
        // no home directory; fall back to the working directory
        None => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_override_the_defaults() {
        let config = Config::try_parse_from([
            "yrtimer",
            "--settings",
            "/tmp/s.json",
            "--state-dir",
            "/tmp/state",
        ])
        .unwrap();
        assert_eq!(config.settings_path(), PathBuf::from("/tmp/s.json"));
        assert_eq!(
            config.state_file(),
            PathBuf::from("/tmp/state/last-state.json")
        );
    }

    #[test]
    fn log_level_honors_verbose_and_debug_setting() {
        let config = Config::try_parse_from(["yrtimer"]).unwrap();
        assert_eq!(config.log_level(false), "info");
        assert_eq!(config.log_level(true), "debug");

        let config = Config::try_parse_from(["yrtimer", "--verbose"]).unwrap();
        assert_eq!(config.log_level(false), "debug");
    }

    #[test]
    fn address_joins_host_and_port() {
        let config = Config::try_parse_from(["yrtimer", "--host", "0.0.0.0", "-p", "9999"]).unwrap();
        assert_eq!(config.address(), "0.0.0.0:9999");
    }
}
