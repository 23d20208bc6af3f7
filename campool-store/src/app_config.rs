use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub board: BoardRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Knobs the board enforces beyond the hard invariants.
#[derive(Debug, Deserialize, Clone)]
pub struct BoardRules {
    #[serde(default = "default_max_seats")]
    pub max_seats_per_ride: u32,
    #[serde(default = "default_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_max_seats() -> u32 {
    8
}

fn default_channel_capacity() -> usize {
    100
}

impl Default for BoardRules {
    fn default() -> Self {
        Self {
            max_seats_per_ride: default_max_seats(),
            event_channel_capacity: default_channel_capacity(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of CAMPOOL)
            // Eg.. `CAMPOOL__DATABASE__URL=...` would set the database url
            .add_source(config::Environment::with_prefix("CAMPOOL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
