//! Configuration module for iconslice
//!
//! Provides types and parsing for `islice.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::{
    default_config, find_config, find_config_from, load_config, load_config_file,
    merge_cli_overrides, parse_config, CliOverrides, ConfigError, CONFIG_FILE_NAME,
};
pub use schema::*;
