//! Shared foundational types for the jitc object cache.
//!
//! This crate provides the CRC-32C checksum used for module identity and
//! object integrity, the code generation optimization level, and the
//! platform key that isolates caches built by incompatible toolchains.

#![warn(missing_docs)]

pub mod crc;
pub mod opt_level;
pub mod platform;

pub use crc::{crc32c, Crc32};
pub use opt_level::{OptLevel, ParseOptLevelError};
pub use platform::{PlatformKey, ToolchainInfo};
