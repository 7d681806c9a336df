//! Configuration file loading, validation, and environment overrides.

use crate::error::ConfigError;
use crate::types::JitcConfig;
use std::path::Path;

/// Name of the configuration file looked up in a directory.
pub const CONFIG_FILE_NAME: &str = "jitc.toml";

/// Environment variable overriding `cache.root`.
pub const ENV_CACHE_DIR: &str = "JITC_CACHE_DIR";

/// Environment variable overriding `cache.enabled` (`1`/`0`, `true`/`false`, `yes`/`no`).
pub const ENV_ENABLE_CACHE: &str = "JITC_ENABLE_CACHE";

/// Loads and validates `<dir>/jitc.toml`.
pub fn load_config(dir: &Path) -> Result<JitcConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE_NAME))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<JitcConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Loads `<dir>/jitc.toml` if it exists, otherwise returns the defaults.
pub fn load_config_or_default(dir: &Path) -> Result<JitcConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.is_file() {
        load_config_file(&path)
    } else {
        Ok(JitcConfig::default())
    }
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<JitcConfig, ConfigError> {
    let config: JitcConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Applies environment overrides on top of a loaded configuration.
///
/// `lookup` is usually `|name| std::env::var(name).ok()`; tests pass a map.
pub fn apply_env_overrides(
    config: &mut JitcConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(dir) = lookup(ENV_CACHE_DIR) {
        if !dir.trim().is_empty() {
            config.cache.root = Some(dir);
        }
    }
    if let Some(value) = lookup(ENV_ENABLE_CACHE) {
        config.cache.enabled = parse_flag(&value).ok_or_else(|| ConfigError::InvalidEnv {
            name: ENV_ENABLE_CACHE.to_string(),
            value: value.clone(),
        })?;
    }
    validate_config(config)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Checks values that deserialize fine but cannot produce a working cache.
fn validate_config(config: &JitcConfig) -> Result<(), ConfigError> {
    if config.cache.root.as_deref().is_some_and(|r| r.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "cache.root must not be empty".to_string(),
        ));
    }
    if config.codegen.target_cpu.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "codegen.target_cpu must not be empty".to_string(),
        ));
    }
    if let Some(tc) = &config.toolchain {
        if tc.pointer_width != 4 && tc.pointer_width != 8 {
            return Err(ConfigError::ValidationError(format!(
                "toolchain.pointer_width must be 4 or 8, got {}",
                tc.pointer_width
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jitc_common::OptLevel;
    use std::collections::HashMap;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert!(config.cache.enabled);
        assert!(config.cache.root.is_none());
        assert!(config.cache.module_prefix.is_none());
        assert_eq!(config.codegen.target_cpu, "generic");
        assert_eq!(config.codegen.opt_level, OptLevel::Default);
        assert!(config.toolchain.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[cache]
root = "/var/cache/jitc"
enabled = false
module_prefix = "JM_"

[codegen]
target_cpu = "skylake-avx512"
opt_level = "aggressive"

[toolchain]
major = 1
minor = 2
patch = 3
pointer_width = 8
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.cache.root.as_deref(), Some("/var/cache/jitc"));
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.module_prefix.as_deref(), Some("JM_"));
        assert_eq!(config.codegen.target_cpu, "skylake-avx512");
        assert_eq!(config.codegen.opt_level, OptLevel::Aggressive);
        assert!(config.toolchain.is_some());
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_opt_level_errors() {
        let err = load_config_from_str("[codegen]\nopt_level = \"turbo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn empty_cpu_errors() {
        let err = load_config_from_str("[codegen]\ntarget_cpu = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_root_errors() {
        let err = load_config_from_str("[cache]\nroot = \" \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn bad_pointer_width_errors() {
        let toml = "[toolchain]\nmajor = 1\nminor = 0\npatch = 0\npointer_width = 16\n";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(err.to_string().contains("pointer_width"));
    }

    #[test]
    fn env_overrides_root_and_enabled() {
        let mut config = load_config_from_str("[cache]\nroot = \"/a\"\n").unwrap();
        let env: HashMap<&str, &str> =
            [(ENV_CACHE_DIR, "/b"), (ENV_ENABLE_CACHE, "0")].into_iter().collect();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.cache.root.as_deref(), Some("/b"));
        assert!(!config.cache.enabled);
    }

    #[test]
    fn env_absent_leaves_config() {
        let mut config = load_config_from_str("[cache]\nenabled = false\n").unwrap();
        apply_env_overrides(&mut config, |_| None).unwrap();
        assert!(!config.cache.enabled);
        assert!(config.cache.root.is_none());
    }

    #[test]
    fn env_invalid_flag_errors() {
        let mut config = JitcConfig::default();
        let err = apply_env_overrides(&mut config, |k| {
            (k == ENV_ENABLE_CACHE).then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[codegen]\ntarget_cpu = \"znver4\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.codegen.target_cpu, "znver4");
    }

    #[test]
    fn missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path()).unwrap();
        assert!(config.cache.enabled);
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
