//! Resolution of cache settings from the config file, environment and flags.
//!
//! Precedence, lowest first: built-in defaults, `jitc.toml` (from `--config`
//! or the current directory), `JITC_CACHE_DIR` / `JITC_ENABLE_CACHE`, then
//! command-line flags.

use std::path::Path;

use jitc_config::{CacheSettings, ConfigError, JitcConfig};
use tracing::debug;

use crate::{GlobalArgs, TargetArgs};

/// Loads the configuration and resolves it into cache settings.
pub fn load_settings(global: &GlobalArgs) -> Result<CacheSettings, Box<dyn std::error::Error>> {
    let mut config = match &global.config {
        Some(path) => jitc_config::load_config_file(Path::new(path))?,
        None => jitc_config::load_config_or_default(&std::env::current_dir()?)?,
    };
    jitc_config::apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    settings_from(&config, global)
}

/// Resolves an already loaded configuration, applying the global flags.
pub fn settings_from(
    config: &JitcConfig,
    global: &GlobalArgs,
) -> Result<CacheSettings, Box<dyn std::error::Error>> {
    let mut settings = jitc_config::resolve(config)?;
    if let Some(root) = &global.root {
        settings.root = root.clone();
    }
    debug!(
        root = %settings.root.display(),
        enabled = settings.enabled,
        platform = %settings.platform_key,
        "cache settings resolved"
    );
    Ok(settings)
}

/// Applies `--cpu` / `--opt` on top of resolved settings.
///
/// A blank `--cpu` is rejected the same way a blank `codegen.target_cpu` is.
pub fn apply_target(
    settings: &mut CacheSettings,
    target: &TargetArgs,
) -> Result<(), ConfigError> {
    if let Some(cpu) = &target.cpu {
        let cpu = cpu.trim();
        if cpu.is_empty() {
            return Err(ConfigError::ValidationError(
                "--cpu must not be empty".to_string(),
            ));
        }
        settings.target_cpu = cpu.to_string();
    }
    if let Some(opt) = target.opt {
        settings.opt_level = opt;
    }
    Ok(())
}
