//! Disk-backed cache of JIT-compiled object code.
//!
//! A compilation request is identified by a [`CacheKey`]: the CRC-32C of the
//! serialized module, the module id, the target CPU and the optimization
//! level. Each compiled object is stored as a pair of files under a directory
//! sharded by the module CRC, with a fixed 96-byte [`CacheFileHeader`] that is
//! validated field by field on lookup. Every lookup failure is a cache miss;
//! a corrupt or misconfigured cache can cost recompilation but never produces
//! a wrong object.
//!
//! [`JitCache`] is the per-thread orchestrator. [`audit`] inspects a cache
//! directory without modifying it.

#![warn(missing_docs)]

pub mod audit;
pub mod cache;
pub mod codes;
pub mod error;
pub mod fs;
pub mod header;
pub mod key;
pub mod module;
pub mod shard;

pub use audit::{audit, AuditReport};
pub use cache::{Compiled, JitCache, Lookup, MissReason};
pub use error::CacheError;
pub use fs::{CacheFs, CountingFs, StdFs};
pub use header::{CacheFileHeader, HeaderMismatch, CACHE_MAGIC, HEADER_SIZE, STRING_CAPACITY};
pub use key::CacheKey;
pub use module::{module_crc, ModuleSerializer, SerializedModule};
pub use shard::{shard_dir, EntryPaths, OBJECT_EXTENSION};
