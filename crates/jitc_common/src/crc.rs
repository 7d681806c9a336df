//! CRC-32C checksums for module identity and object integrity.
//!
//! Uses the Castagnoli polynomial in its reflected form with a precomputed
//! lookup table. Checksums are not cryptographic: they identify modules and
//! detect accidental corruption of cached objects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reflected CRC-32C (Castagnoli) polynomial.
const CRC32C_POLY: u32 = 0x82F6_3B78;

/// Precomputed CRC-32C lookup table (256 entries, LSB-first).
const CRC32C_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ CRC32C_POLY;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Computes CRC-32C over `data`, continuing from `seed`.
///
/// A seed of `0` starts a fresh checksum. Passing the result of a previous
/// call as the seed continues it, so `crc32c(crc32c(0, a), b)` equals the
/// checksum of `a` followed by `b`.
pub fn crc32c(seed: u32, data: &[u8]) -> u32 {
    let mut crc = !seed;
    for &byte in data {
        let idx = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32C_TABLE[idx];
    }
    !crc
}

/// A 32-bit CRC-32C checksum.
///
/// Used as the module component of a cache key and as the integrity check
/// of a cached object blob.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Crc32(u32);

impl Crc32 {
    /// Computes the checksum of a byte slice from a zero seed.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(crc32c(0, data))
    }

    /// Wraps a raw checksum value, e.g. one read back from a header.
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw checksum value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the checksum bytes in little-endian order.
    pub const fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for Crc32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Crc32({:08x})", self.0)
    }
}
