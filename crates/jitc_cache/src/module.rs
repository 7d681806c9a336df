//! The module side of a cache key.

use jitc_common::{crc32c, Crc32};

use crate::error::CacheError;

/// A compilation unit that can be turned into a canonical byte sequence.
///
/// Implemented by the JIT's in-memory module type. The bytes only need to be
/// stable for identical modules; they are hashed, never stored.
pub trait ModuleSerializer {
    /// The module's identifier, used as the cache entry's file name.
    fn module_id(&self) -> &str;

    /// Appends the canonical serialization of the module to `out`.
    fn serialize_into(&self, out: &mut Vec<u8>) -> Result<(), String>;
}

/// A module that is already in serialized form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializedModule {
    id: String,
    bytes: Vec<u8>,
}

impl SerializedModule {
    /// Wraps the serialized bytes of the module named `id`.
    pub fn new(id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            bytes: bytes.into(),
        }
    }

    /// The serialized bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl ModuleSerializer for SerializedModule {
    fn module_id(&self) -> &str {
        &self.id
    }

    fn serialize_into(&self, out: &mut Vec<u8>) -> Result<(), String> {
        out.extend_from_slice(&self.bytes);
        Ok(())
    }
}

/// Serializes `module` and returns the CRC of the result.
pub fn module_crc<M: ModuleSerializer + ?Sized>(module: &M) -> Result<Crc32, CacheError> {
    let mut buf = Vec::new();
    module
        .serialize_into(&mut buf)
        .map_err(|reason| CacheError::Serialization {
            module_id: module.module_id().to_string(),
            reason,
        })?;
    Ok(Crc32::from_raw(crc32c(0, &buf)))
}
