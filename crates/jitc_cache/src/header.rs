//! The fixed-layout header stored alongside every cached object.
//!
//! Layout (96 bytes, little-endian, no padding):
//!
//! | offset | field          | type       |
//! |-------:|----------------|------------|
//! |      0 | `magic`        | `u64`      |
//! |      8 | `object_size`  | `u64`      |
//! |     16 | `source_crc`   | `u32`      |
//! |     20 | `platform_key` | `u32`      |
//! |     24 | `object_crc`   | `u32`      |
//! |     28 | `opt_level`    | `u32`      |
//! |     32 | `module_id`    | `[u8; 32]` |
//! |     64 | `cpu`          | `[u8; 32]` |
//!
//! The two strings are truncated to 31 bytes and NUL padded. Encoding uses
//! bincode's legacy configuration (little-endian, fixed-width integers), which
//! serializes the struct fields in declaration order without framing.

use std::fmt;

use jitc_common::{Crc32, OptLevel, PlatformKey};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::key::CacheKey;

/// Format revision folded into the magic number. Increment on any change to
/// the header layout or the object file format.
const HEADER_REVISION: u64 = 1;

/// Magic number identifying a jitc header record.
pub const CACHE_MAGIC: u64 = 0xFEDC_BA98_7654_3210 + HEADER_REVISION;

/// Capacity of each fixed string field, including the terminating NUL.
pub const STRING_CAPACITY: usize = 32;

/// Encoded size of a [`CacheFileHeader`] in bytes.
pub const HEADER_SIZE: usize = 8 + 8 + 4 * 4 + 2 * STRING_CAPACITY;

/// Header written next to a cached object.
///
/// Built once right before the object is persisted and never modified
/// afterwards: an entry is either valid as a whole or ignored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheFileHeader {
    /// Must equal [`CACHE_MAGIC`].
    pub magic: u64,
    /// Length of the object file in bytes.
    pub object_size: u64,
    /// CRC of the serialized module the object was compiled from.
    pub source_crc: u32,
    /// Platform key of the build that wrote the entry.
    pub platform_key: u32,
    /// CRC of the object bytes.
    pub object_crc: u32,
    /// Optimization level ordinal.
    pub opt_level: u32,
    /// Truncated, NUL-padded module id.
    pub module_id: [u8; STRING_CAPACITY],
    /// Truncated, NUL-padded target CPU name.
    pub cpu: [u8; STRING_CAPACITY],
}

/// The first header field that disagreed with the expected key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderMismatch {
    /// Not a jitc header, or one from another format revision.
    Magic,
    /// Written by a build with a different platform key.
    Platform {
        /// Key of the running build.
        expected: PlatformKey,
        /// Key stored in the header.
        found: PlatformKey,
    },
    /// Compiled at a different optimization level.
    OptLevel,
    /// Compiled from a module with a different CRC.
    SourceCrc,
    /// Stored under a different (truncated) module id.
    ModuleId,
    /// Compiled for a different (truncated) target CPU.
    Cpu,
}

impl fmt::Display for HeaderMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderMismatch::Magic => write!(f, "bad magic number"),
            HeaderMismatch::Platform { expected, found } => {
                write!(f, "platform key {found} does not match {expected}")
            }
            HeaderMismatch::OptLevel => write!(f, "optimization level differs"),
            HeaderMismatch::SourceCrc => write!(f, "source CRC differs"),
            HeaderMismatch::ModuleId => write!(f, "module id differs"),
            HeaderMismatch::Cpu => write!(f, "target CPU differs"),
        }
    }
}

/// Truncates `s` to `STRING_CAPACITY - 1` bytes and NUL pads it.
///
/// Truncation is byte-wise and may split a multi-byte character; the field
/// is only ever compared byte-for-byte.
pub fn fixed_string(s: &str) -> [u8; STRING_CAPACITY] {
    let mut out = [0u8; STRING_CAPACITY];
    let bytes = s.as_bytes();
    let len = bytes.len().min(STRING_CAPACITY - 1);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

/// Reads a fixed string field up to its first NUL, replacing invalid UTF-8.
pub fn fixed_string_lossy(field: &[u8; STRING_CAPACITY]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(STRING_CAPACITY);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

impl CacheFileHeader {
    /// Builds the header for a freshly compiled object.
    ///
    /// `module_id` and `cpu` are silently truncated to fit their fields.
    pub fn new(
        source_crc: Crc32,
        object_crc: Crc32,
        module_id: &str,
        cpu: &str,
        opt_level: OptLevel,
        object_size: u64,
        platform_key: PlatformKey,
    ) -> Self {
        Self {
            magic: CACHE_MAGIC,
            object_size,
            source_crc: source_crc.get(),
            platform_key: platform_key.get(),
            object_crc: object_crc.get(),
            opt_level: opt_level.as_u32(),
            module_id: fixed_string(module_id),
            cpu: fixed_string(cpu),
        }
    }

    /// Builds the header for `object`, compiled from the module identified by `key`.
    pub fn for_object(key: &CacheKey, object: &[u8], platform_key: PlatformKey) -> Self {
        Self::new(
            key.module_crc,
            Crc32::from_bytes(object),
            &key.module_id,
            &key.target_cpu,
            key.opt_level,
            object.len() as u64,
            platform_key,
        )
    }

    /// Checks every identity field against `key`, reporting the first mismatch.
    pub fn check(&self, key: &CacheKey, platform_key: PlatformKey) -> Result<(), HeaderMismatch> {
        if self.magic != CACHE_MAGIC {
            return Err(HeaderMismatch::Magic);
        }
        if self.platform_key != platform_key.get() {
            return Err(HeaderMismatch::Platform {
                expected: platform_key,
                found: PlatformKey::from_raw(self.platform_key),
            });
        }
        if self.opt_level != key.opt_level.as_u32() {
            return Err(HeaderMismatch::OptLevel);
        }
        if self.source_crc != key.module_crc.get() {
            return Err(HeaderMismatch::SourceCrc);
        }
        if self.module_id != fixed_string(&key.module_id) {
            return Err(HeaderMismatch::ModuleId);
        }
        if self.cpu != fixed_string(&key.target_cpu) {
            return Err(HeaderMismatch::Cpu);
        }
        Ok(())
    }

    /// Returns `true` if this header describes an object usable for `key`
    /// under the given platform key.
    pub fn is_valid(&self, key: &CacheKey, platform_key: PlatformKey) -> bool {
        self.check(key, platform_key).is_ok()
    }

    /// The stored source CRC.
    pub fn source_crc(&self) -> Crc32 {
        Crc32::from_raw(self.source_crc)
    }

    /// The stored object CRC.
    pub fn object_crc(&self) -> Crc32 {
        Crc32::from_raw(self.object_crc)
    }

    /// The stored platform key.
    pub fn platform_key(&self) -> PlatformKey {
        PlatformKey::from_raw(self.platform_key)
    }

    /// The stored optimization level, if the ordinal is known.
    pub fn opt_level(&self) -> Option<OptLevel> {
        OptLevel::from_u32(self.opt_level)
    }

    /// The stored (possibly truncated) module id.
    pub fn module_id_lossy(&self) -> String {
        fixed_string_lossy(&self.module_id)
    }

    /// The stored (possibly truncated) CPU name.
    pub fn cpu_lossy(&self) -> String {
        fixed_string_lossy(&self.cpu)
    }

    /// Encodes the header into its 96-byte layout.
    pub fn encode(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serde::encode_to_vec(self, bincode::config::legacy()).map_err(|e| CacheError::HeaderEncode {
            reason: e.to_string(),
        })
    }

    /// Decodes a header from the start of `bytes`.
    ///
    /// Fails if fewer than [`HEADER_SIZE`] bytes are available. Field values
    /// are not checked here; see [`check`](Self::check).
    pub fn decode(bytes: &[u8]) -> Result<Self, CacheError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CacheError::InvalidHeader {
                reason: format!("expected {HEADER_SIZE} bytes, found {}", bytes.len()),
            });
        }
        let (header, _) = bincode::serde::decode_from_slice(&bytes[..HEADER_SIZE], bincode::config::legacy())
            .map_err(|e| CacheError::InvalidHeader {
                reason: e.to_string(),
            })?;
        Ok(header)
    }
}

impl fmt::Debug for CacheFileHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheFileHeader")
            .field("magic", &format_args!("{:#018x}", self.magic))
            .field("object_size", &self.object_size)
            .field("source_crc", &self.source_crc())
            .field("platform_key", &self.platform_key())
            .field("object_crc", &self.object_crc())
            .field("opt_level", &self.opt_level)
            .field("module_id", &self.module_id_lossy())
            .field("cpu", &self.cpu_lossy())
            .finish()
    }
}
