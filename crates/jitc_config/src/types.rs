//! Configuration types deserialized from `jitc.toml`.

use jitc_common::{OptLevel, ToolchainInfo};
use serde::Deserialize;

/// The top-level configuration parsed from `jitc.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct JitcConfig {
    /// Where and whether objects are cached.
    #[serde(default)]
    pub cache: CacheSection,
    /// Code generation target, part of every cache key.
    #[serde(default)]
    pub codegen: CodegenSection,
    /// Overrides the toolchain facts the platform key is derived from.
    ///
    /// Normally absent: the key of the running build is used.
    #[serde(default)]
    pub toolchain: Option<ToolchainInfo>,
}

/// The `[cache]` table.
#[derive(Debug, Deserialize)]
pub struct CacheSection {
    /// Root directory of the cache. Defaults to `<user cache dir>/jitc`.
    #[serde(default)]
    pub root: Option<String>,
    /// When false, lookups always miss and stores do nothing.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Only modules whose id starts with this prefix are cached.
    #[serde(default)]
    pub module_prefix: Option<String>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            root: None,
            enabled: default_enabled(),
            module_prefix: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// The `[codegen]` table.
#[derive(Debug, Deserialize)]
pub struct CodegenSection {
    /// Target CPU microarchitecture name (e.g. `"skylake"`).
    #[serde(default = "default_target_cpu")]
    pub target_cpu: String,
    /// Optimization level passed to the code generator.
    #[serde(default)]
    pub opt_level: OptLevel,
}

impl Default for CodegenSection {
    fn default() -> Self {
        Self {
            target_cpu: default_target_cpu(),
            opt_level: OptLevel::default(),
        }
    }
}

fn default_target_cpu() -> String {
    "generic".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn opt_level_all_variants() {
        for (input, expected) in [
            ("none", OptLevel::None),
            ("less", OptLevel::Less),
            ("default", OptLevel::Default),
            ("aggressive", OptLevel::Aggressive),
        ] {
            let toml = format!("[codegen]\nopt_level = \"{input}\"\n");
            let config = load_config_from_str(&toml).unwrap();
            assert_eq!(config.codegen.opt_level, expected);
        }
    }

    #[test]
    fn toolchain_table() {
        let toml = r#"
[toolchain]
major = 15
minor = 0
patch = 7
pointer_width = 4
"#;
        let config = load_config_from_str(toml).unwrap();
        let tc = config.toolchain.unwrap();
        assert_eq!((tc.major, tc.minor, tc.patch, tc.pointer_width), (15, 0, 7, 4));
    }

    #[test]
    fn section_defaults() {
        let cache = CacheSection::default();
        assert!(cache.enabled);
        assert!(cache.root.is_none());
        let codegen = CodegenSection::default();
        assert_eq!(codegen.target_cpu, "generic");
        assert_eq!(codegen.opt_level, OptLevel::Default);
    }
}
