//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name used inside the config directory.
pub const CONFIG_FILE: &str = "config.ron";

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Driver loop settings.
    pub server: ServerConfig,
    /// Movement and collision tuning.
    pub physics: PhysicsConfig,
    /// Damage pipeline timings and strengths.
    pub combat: CombatConfig,
    /// Fire, freezing, air supply and hazard damage.
    pub environment: EnvironmentConfig,
    /// Portal search and riding limits.
    pub portal: PortalConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Driver loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Seed for every region's random source.
    pub seed: u64,
    /// Number of ticks the headless driver runs before exiting (0 = forever).
    pub ticks: u64,
    /// Entities spawned into the demo overworld at startup.
    pub demo_entities: u32,
    /// Sleep between ticks to hold `tick_rate`; disabled for batch runs.
    pub realtime: bool,
}

/// Movement and collision configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Distance below the region floor at which entities are out of the world.
    pub out_of_world_margin: f64,
    /// Largest accumulated piston displacement per axis within one game tick.
    pub piston_limit: f64,
    /// Horizontal distance multiplier feeding step/swim markers.
    pub step_distance_scale: f64,
    /// Angle (degrees) under which a horizontal collision counts as minor.
    pub minor_collision_degrees: f64,
    /// Ticks a dismounted entity waits before it may board again.
    pub boarding_cooldown_ticks: i32,
}

/// Damage pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CombatConfig {
    /// Length of the invulnerability window after a registered hit.
    pub invulnerability_ticks: i32,
    /// Length of the hurt animation marker.
    pub hurt_duration_ticks: i32,
    /// Ticks after which the last damage source is forgotten.
    pub damage_source_expiry_ticks: u64,
    /// Ticks an attacker keeps kill credit after its last hit.
    pub kill_credit_ticks: u64,
    /// Knockback strength applied by a hit with a causing entity.
    pub knockback_strength: f64,
    /// Knockback applied to an attacker whose hit was blocked.
    pub shield_knockback: f64,
    /// Ticks between death and removal.
    pub death_animation_ticks: i32,
    /// Damage dealt each tick below the out-of-world line.
    pub out_of_world_damage: f32,
    /// Fall distance that never causes damage.
    pub safe_fall_distance: f32,
}

/// Thermal and hazard configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Air supply of a living entity with empty lungs refilled.
    pub max_air_supply: i32,
    /// Air regained per tick outside water.
    pub air_refill_per_tick: i32,
    /// Damage per tick once air is exhausted.
    pub drowning_damage: f32,
    /// Damage per tick while the eyes are inside a solid block.
    pub suffocation_damage: f32,
    /// Frozen ticks needed to be fully frozen.
    pub ticks_to_freeze: i32,
    /// Interval in ticks between freeze damage applications.
    pub freeze_damage_interval: u32,
    /// Damage per freeze application.
    pub freeze_damage: f32,
    /// Interval in ticks between on-fire damage applications.
    pub fire_damage_interval: i32,
    /// Seconds of burning applied by lava contact.
    pub lava_fire_seconds: i32,
    /// Damage per tick of lava contact.
    pub lava_damage: f32,
    /// Seconds of burning applied by fire blocks.
    pub fire_block_seconds: i32,
    /// Damage per tick inside a fire block.
    pub fire_block_damage: f32,
}

/// Portal configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PortalConfig {
    /// Search radius for an existing portal outside the nether.
    pub search_radius: i32,
    /// Search radius for an existing portal when entering the nether.
    pub nether_search_radius: i32,
    /// Search radius for a place to build a new portal.
    pub create_radius: i32,
    /// Largest frame edge considered when measuring a portal.
    pub max_frame_size: i32,
    /// Arrival block position in the end.
    pub end_spawn: [i32; 3],
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Directory for JSON log files in debug builds.
    pub log_dir: Option<PathBuf>,
}

// --- Default implementations ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            seed: 0,
            ticks: 200,
            demo_entities: 8,
            realtime: false,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            out_of_world_margin: 64.0,
            piston_limit: 0.51,
            step_distance_scale: 0.6,
            minor_collision_degrees: 8.0,
            boarding_cooldown_ticks: 60,
        }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            invulnerability_ticks: 20,
            hurt_duration_ticks: 10,
            damage_source_expiry_ticks: 40,
            kill_credit_ticks: 100,
            knockback_strength: 0.4,
            shield_knockback: 0.5,
            death_animation_ticks: 20,
            out_of_world_damage: 4.0,
            safe_fall_distance: 3.0,
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            max_air_supply: 300,
            air_refill_per_tick: 4,
            drowning_damage: 2.0,
            suffocation_damage: 1.0,
            ticks_to_freeze: 140,
            freeze_damage_interval: 40,
            freeze_damage: 1.0,
            fire_damage_interval: 20,
            lava_fire_seconds: 15,
            lava_damage: 4.0,
            fire_block_seconds: 8,
            fire_block_damage: 1.0,
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            search_radius: 128,
            nether_search_radius: 16,
            create_radius: 16,
            max_frame_size: 21,
            end_spawn: [100, 50, 0],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Platform config directory for the simulation (`<config>/tessera`).
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|d| d.join("tessera"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(ConfigError::WriteError)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(bool, &'static str, &'static str); 8] = [
            (self.server.tick_rate >= 1, "server.tick_rate", "must be at least 1"),
            (
                self.environment.fire_damage_interval > 0,
                "environment.fire_damage_interval",
                "must be positive",
            ),
            (
                self.environment.freeze_damage_interval > 0,
                "environment.freeze_damage_interval",
                "must be positive",
            ),
            (
                self.environment.max_air_supply > 0,
                "environment.max_air_supply",
                "must be positive",
            ),
            (
                self.physics.piston_limit.is_finite() && self.physics.piston_limit >= 0.0,
                "physics.piston_limit",
                "must be a finite non-negative distance",
            ),
            (
                self.physics.out_of_world_margin.is_finite(),
                "physics.out_of_world_margin",
                "must be finite",
            ),
            (
                self.portal.max_frame_size >= 3,
                "portal.max_frame_size",
                "must fit a 2x3 portal",
            ),
            (
                self.portal.search_radius >= 0
                    && self.portal.nether_search_radius >= 0
                    && self.portal.create_radius >= 0,
                "portal",
                "radii must be non-negative",
            ),
        ];
        match checks.into_iter().find(|(ok, _, _)| !ok) {
            Some((_, field, reason)) => Err(ConfigError::Invalid { field, reason }),
            None => Ok(()),
        }
    }

    /// Re-read the file; `Some` only when it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = std::fs::read_to_string(config_dir.join(CONFIG_FILE))
            .map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        new_config.validate()?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("tick_rate: 20"));
        assert!(ron_str.contains("invulnerability_ticks: 20"));
    }

    #[test]
    fn test_defaults_match_vanilla_timings() {
        let config = Config::default();
        assert_eq!(config.combat.damage_source_expiry_ticks, 40);
        assert_eq!(config.environment.max_air_supply, 300);
        assert_eq!(config.environment.ticks_to_freeze, 140);
        assert_eq!(config.portal.end_spawn, [100, 50, 0]);
        assert!((config.physics.piston_limit - 0.51).abs() < 1e-12);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let config: Config = ron::from_str("(server: (seed: 9))").unwrap();
        assert_eq!(config.server.seed, 9);
        assert_eq!(config.server.tick_rate, 20);
        assert_eq!(config.combat, CombatConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.server.seed = 1234;
        config.combat.knockback_strength = 0.6;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.environment.lava_damage = 6.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.map(|c| c.environment.lava_damage), Some(6.0));
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.environment.freeze_damage_interval = 0;
        config.save(dir.path()).unwrap();
        let result = Config::load_or_create(dir.path());
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "environment.freeze_damage_interval", .. })
        ));
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        let result = Config::load_or_create(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
