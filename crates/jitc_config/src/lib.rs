//! Parsing, validation, and resolution of `jitc.toml` cache configuration.
//!
//! The configuration file is optional: every field has a default, and the
//! `JITC_CACHE_DIR` / `JITC_ENABLE_CACHE` environment variables override the
//! file. [`resolve`] turns the parsed file into the [`CacheSettings`] a cache
//! instance is built from.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{
    apply_env_overrides, load_config, load_config_file, load_config_from_str,
    load_config_or_default, CONFIG_FILE_NAME, ENV_CACHE_DIR, ENV_ENABLE_CACHE,
};
pub use resolve::{default_cache_root, resolve, CacheSettings};
pub use types::*;
