//! Command-line argument parsing for the headless simulation driver.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Tessera server command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "tessera-server", about = "Headless Tessera entity simulation")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Ticks to run before exiting (0 = forever).
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Ticks per second.
    #[arg(long)]
    pub tick_rate: Option<u32>,

    /// Pace ticks in real time instead of running as fast as possible.
    #[arg(long)]
    pub realtime: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.server.seed = seed;
        }
        if let Some(ticks) = args.ticks {
            self.server.ticks = ticks;
        }
        if let Some(rate) = args.tick_rate {
            self.server.tick_rate = rate.max(1);
        }
        if args.realtime {
            self.server.realtime = true;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(42),
            tick_rate: Some(0),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.server.seed, 42);
        assert_eq!(config.server.tick_rate, 1, "tick rate is clamped to at least 1");
        assert_eq!(config.debug.log_level, "debug");
        assert_eq!(config.server.ticks, 200);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["tessera-server", "--ticks", "50", "--realtime"]);
        assert_eq!(args.ticks, Some(50));
        assert!(args.realtime);
        assert!(args.seed.is_none());
    }
}
