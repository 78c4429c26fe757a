//! Configuration system for the Tessera simulation.
//!
//! Runtime-tunable settings persisted as RON, with CLI overrides via clap and
//! hot-reload detection. Every section uses `#[serde(default)]` so older files
//! keep loading as fields are added.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE, CombatConfig, Config, DebugConfig, EnvironmentConfig, PhysicsConfig,
    PortalConfig, ServerConfig,
};
pub use error::ConfigError;
