//! Code generation optimization levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How aggressively the native code generator optimizes a module.
///
/// Part of every cache key: the same module legitimately produces different
/// objects at different levels. Persisted as its ordinal (`0..=3`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptLevel {
    /// No optimization.
    None,
    /// Cheap optimizations only.
    Less,
    /// The code generator's standard pipeline (default).
    #[default]
    Default,
    /// All optimizations, regardless of compile time.
    Aggressive,
}

impl OptLevel {
    /// Returns the ordinal stored in cache headers.
    pub const fn as_u32(self) -> u32 {
        match self {
            OptLevel::None => 0,
            OptLevel::Less => 1,
            OptLevel::Default => 2,
            OptLevel::Aggressive => 3,
        }
    }

    /// Maps a stored ordinal back to a level, if it is in range.
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(OptLevel::None),
            1 => Some(OptLevel::Less),
            2 => Some(OptLevel::Default),
            3 => Some(OptLevel::Aggressive),
            _ => None,
        }
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptLevel::None => write!(f, "none"),
            OptLevel::Less => write!(f, "less"),
            OptLevel::Default => write!(f, "default"),
            OptLevel::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// Error type for parsing optimization level strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptLevelError {
    /// The input string that failed to parse.
    pub input: String,
}

impl fmt::Display for ParseOptLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid optimization level: '{}'", self.input)
    }
}

impl std::error::Error for ParseOptLevelError {}

impl FromStr for OptLevel {
    type Err = ParseOptLevelError;

    /// Accepts the level names (case-insensitive) or their ordinals `0`-`3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "none" | "0" => Ok(OptLevel::None),
            "less" | "1" => Ok(OptLevel::Less),
            "default" | "2" => Ok(OptLevel::Default),
            "aggressive" | "3" => Ok(OptLevel::Aggressive),
            _ => Err(ParseOptLevelError {
                input: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_roundtrip() {
        for level in [
            OptLevel::None,
            OptLevel::Less,
            OptLevel::Default,
            OptLevel::Aggressive,
        ] {
            assert_eq!(OptLevel::from_u32(level.as_u32()), Some(level));
        }
        assert_eq!(OptLevel::from_u32(4), None);
    }

    #[test]
    fn parse_names_and_ordinals() {
        assert_eq!("none".parse::<OptLevel>().unwrap(), OptLevel::None);
        assert_eq!("Aggressive".parse::<OptLevel>().unwrap(), OptLevel::Aggressive);
        assert_eq!(" 1 ".parse::<OptLevel>().unwrap(), OptLevel::Less);
    }

    #[test]
    fn parse_invalid() {
        let err = "turbo".parse::<OptLevel>().unwrap_err();
        assert_eq!(err.to_string(), "invalid optimization level: 'turbo'");
    }

    #[test]
    fn ordering_follows_aggressiveness() {
        assert!(OptLevel::None < OptLevel::Less);
        assert!(OptLevel::Default < OptLevel::Aggressive);
    }

    #[test]
    fn default_and_display() {
        assert_eq!(OptLevel::default(), OptLevel::Default);
        assert_eq!(OptLevel::Aggressive.to_string(), "aggressive");
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&OptLevel::Less).unwrap();
        assert_eq!(json, "\"less\"");
        let back: OptLevel = serde_json::from_str("\"aggressive\"").unwrap();
        assert_eq!(back, OptLevel::Aggressive);
    }
}
