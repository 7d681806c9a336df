//! Resolution of a parsed configuration into concrete cache settings.

use crate::error::ConfigError;
use crate::types::JitcConfig;
use jitc_common::{OptLevel, PlatformKey};
use std::path::{Path, PathBuf};

/// Everything a cache instance needs, with defaults filled in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheSettings {
    /// Root directory under which shard directories are created.
    pub root: PathBuf,
    /// When false, lookups always miss and stores do nothing.
    pub enabled: bool,
    /// Only module ids with this prefix are cached.
    pub module_prefix: Option<String>,
    /// Target CPU name folded into every key.
    pub target_cpu: String,
    /// Optimization level folded into every key.
    pub opt_level: OptLevel,
    /// Key of the toolchain entries must have been built with.
    pub platform_key: PlatformKey,
}

impl CacheSettings {
    /// Enabled settings rooted at `root` with default codegen options and the
    /// running build's platform key.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            enabled: true,
            module_prefix: None,
            target_cpu: "generic".to_string(),
            opt_level: OptLevel::default(),
            platform_key: PlatformKey::current(),
        }
    }
}

/// The cache root used when the configuration names none.
///
/// `<platform cache dir>/jitc`, falling back to the temp directory when the
/// platform has no per-user cache directory.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("jitc")
}

/// Resolves a configuration into cache settings.
pub fn resolve(config: &JitcConfig) -> Result<CacheSettings, ConfigError> {
    let root = match config.cache.root.as_deref() {
        Some(r) if r.trim().is_empty() => {
            return Err(ConfigError::ValidationError(
                "cache.root must not be empty".to_string(),
            ))
        }
        Some(r) => PathBuf::from(r),
        None => default_cache_root(),
    };

    let platform_key = config
        .toolchain
        .map(PlatformKey::new)
        .unwrap_or_else(PlatformKey::current);

    Ok(CacheSettings {
        root,
        enabled: config.cache.enabled,
        module_prefix: config
            .cache
            .module_prefix
            .clone()
            .filter(|p| !p.is_empty()),
        target_cpu: config.codegen.target_cpu.trim().to_string(),
        opt_level: config.codegen.opt_level,
        platform_key,
    })
}
