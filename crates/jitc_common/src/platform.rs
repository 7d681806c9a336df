//! Platform keys that keep caches from incompatible builds apart.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The toolchain facts folded into a [`PlatformKey`].
///
/// Objects produced by a different code generator version or for a
/// different pointer width must never be reused, so both are part of the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolchainInfo {
    /// Major version of the code generator.
    pub major: u8,
    /// Minor version of the code generator.
    pub minor: u8,
    /// Patch version of the code generator.
    pub patch: u8,
    /// Pointer width of the target in bytes (4 or 8).
    pub pointer_width: u8,
}

impl ToolchainInfo {
    /// Describes the running build: this crate's version and the host pointer width.
    pub const fn current() -> Self {
        Self {
            major: parse_component(env!("CARGO_PKG_VERSION_MAJOR")),
            minor: parse_component(env!("CARGO_PKG_VERSION_MINOR")),
            patch: parse_component(env!("CARGO_PKG_VERSION_PATCH")),
            pointer_width: std::mem::size_of::<usize>() as u8,
        }
    }
}

/// Parses a decimal version component at compile time, saturating at 255.
const fn parse_component(s: &str) -> u8 {
    let bytes = s.as_bytes();
    let mut value: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let digit = bytes[i];
        if digit < b'0' || digit > b'9' {
            break;
        }
        value = value * 10 + (digit - b'0') as u32;
        if value > 255 {
            return 255;
        }
        i += 1;
    }
    value as u8
}

/// A 32-bit key identifying the toolchain and pointer width a cache entry was built with.
///
/// Layout: `major << 24 | minor << 16 | patch << 8 | wide`, where `wide` is
/// `1` for 8-byte pointers and `0` otherwise.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformKey(u32);

impl PlatformKey {
    /// Derives the key from toolchain information.
    pub const fn new(info: ToolchainInfo) -> Self {
        let wide = if info.pointer_width > 4 { 1 } else { 0 };
        Self(
            (info.major as u32) << 24
                | (info.minor as u32) << 16
                | (info.patch as u32) << 8
                | wide,
        )
    }

    /// The key of the running build.
    pub const fn current() -> Self {
        Self::new(ToolchainInfo::current())
    }

    /// Wraps a raw key, e.g. one read back from a header.
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw key value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, patch, wide] = self.0.to_be_bytes();
        let bits = if wide == 1 { 64 } else { 32 };
        write!(f, "{major}.{minor}.{patch}/{bits}-bit")
    }
}

impl fmt::Debug for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlatformKey({:08x})", self.0)
    }
}
