//! The store/lookup orchestrator.
//!
//! [`JitCache`] runs the cache protocol for one compiling thread: compute the
//! key of a module, probe its shard directory, validate the header and the
//! object bytes, and on a miss store the freshly compiled object. Every
//! lookup failure degrades to a miss; only serialization failures are errors.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use jitc_common::{Crc32, OptLevel};
use jitc_config::CacheSettings;
use jitc_diagnostics::{Diagnostic, DiagnosticSink};
use tracing::{debug, trace, warn};

use crate::codes;
use crate::error::CacheError;
use crate::fs::{CacheFs, StdFs};
use crate::header::{CacheFileHeader, HeaderMismatch};
use crate::key::CacheKey;
use crate::module::{module_crc, ModuleSerializer};
use crate::shard::{is_valid_file_name, EntryPaths};

/// Why a lookup did not produce an object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MissReason {
    /// Caching is turned off.
    Disabled,
    /// The module id is filtered out or cannot name a file.
    NotCacheable,
    /// The shard directory for the module CRC does not exist.
    NoShardDir,
    /// The header file is missing or too short to decode.
    HeaderUnreadable,
    /// The header belongs to a different key or build.
    HeaderInvalid(HeaderMismatch),
    /// The header matched but the object file could not be read.
    ObjectUnreadable,
    /// The header matched but the object bytes do not.
    Corrupt {
        /// Object CRC recorded in the header.
        expected: Crc32,
        /// CRC of the bytes actually read.
        actual: Crc32,
    },
}

impl MissReason {
    /// Returns `true` for damaged entries, as opposed to ordinary misses.
    pub fn is_corruption(&self) -> bool {
        matches!(self, MissReason::Corrupt { .. })
    }

    /// Returns `true` if a compiled object should be stored after this miss.
    pub fn is_storable(&self) -> bool {
        !matches!(self, MissReason::Disabled | MissReason::NotCacheable)
    }
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::Disabled => write!(f, "cache disabled"),
            MissReason::NotCacheable => write!(f, "module is not cacheable"),
            MissReason::NoShardDir => write!(f, "no shard directory"),
            MissReason::HeaderUnreadable => write!(f, "header missing or unreadable"),
            MissReason::HeaderInvalid(m) => write!(f, "header mismatch: {m}"),
            MissReason::ObjectUnreadable => write!(f, "object file missing or unreadable"),
            MissReason::Corrupt { expected, actual } => {
                write!(f, "object CRC {actual} does not match header CRC {expected}")
            }
        }
    }
}

/// The outcome of a lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// The cached object bytes.
    Hit(Vec<u8>),
    /// Nothing usable was cached; the caller must compile.
    Miss(MissReason),
}

impl Lookup {
    /// Returns `true` on a hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// Returns the object bytes on a hit.
    pub fn into_object(self) -> Option<Vec<u8>> {
        match self {
            Lookup::Hit(object) => Some(object),
            Lookup::Miss(_) => None,
        }
    }

    /// Returns the miss reason, if this is a miss.
    pub fn miss_reason(&self) -> Option<&MissReason> {
        match self {
            Lookup::Hit(_) => None,
            Lookup::Miss(reason) => Some(reason),
        }
    }
}

/// Result of [`JitCache::compile_with_cache`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Compiled {
    /// The native object bytes.
    pub object: Vec<u8>,
    /// Whether the bytes came from the cache rather than the compiler.
    pub from_cache: bool,
}

/// What a following `store` should do.
#[derive(Debug)]
enum Pending {
    /// No lookup since the last store.
    Nothing,
    /// The last lookup was not storable; `store` is a no-op.
    Skip,
    /// Store under this key.
    Key(CacheKey),
}

/// Cache orchestrator for one compiling thread.
///
/// Holds the settings, the filesystem, and the key of the module looked up
/// last, which [`store`](Self::store) consumes. Not meant to be shared: give
/// each compiling thread its own instance. Instances may share a
/// [`DiagnosticSink`] and a cache root.
pub struct JitCache<F: CacheFs = StdFs> {
    settings: CacheSettings,
    fs: F,
    sink: Option<Arc<DiagnosticSink>>,
    pending: Pending,
}

impl JitCache<StdFs> {
    /// Creates a cache on the real filesystem.
    pub fn new(settings: CacheSettings) -> Self {
        Self::with_fs(settings, StdFs)
    }
}

impl<F: CacheFs> JitCache<F> {
    /// Creates a cache that performs all file access through `fs`.
    pub fn with_fs(settings: CacheSettings, fs: F) -> Self {
        Self {
            settings,
            fs,
            sink: None,
            pending: Pending::Nothing,
        }
    }

    /// Reports corrupt entries and store failures into `sink`.
    pub fn with_sink(mut self, sink: Arc<DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The settings this cache was created with.
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// The filesystem this cache uses.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Returns `true` if caching is turned on.
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Switches the target CPU and optimization level used for later keys.
    pub fn set_target(&mut self, target_cpu: impl Into<String>, opt_level: OptLevel) {
        self.settings.target_cpu = target_cpu.into();
        self.settings.opt_level = opt_level;
        self.pending = Pending::Nothing;
    }

    /// The key the next `store` will write, if any.
    pub fn pending_key(&self) -> Option<&CacheKey> {
        match &self.pending {
            Pending::Key(key) => Some(key),
            Pending::Nothing | Pending::Skip => None,
        }
    }

    /// Returns `true` if modules named `module_id` are cached at all.
    pub fn is_cacheable(&self, module_id: &str) -> bool {
        is_valid_file_name(module_id)
            && self
                .settings
                .module_prefix
                .as_deref()
                .map_or(true, |prefix| module_id.starts_with(prefix))
    }

    /// Computes the key of `module` under the current target settings.
    pub fn key_for<M: ModuleSerializer + ?Sized>(&self, module: &M) -> Result<CacheKey, CacheError> {
        Ok(CacheKey::new(
            module_crc(module)?,
            module.module_id(),
            self.settings.target_cpu.clone(),
            self.settings.opt_level,
        ))
    }

    /// Looks up the compiled object for `module`.
    ///
    /// Remembers the module's key for a following [`store`](Self::store).
    /// When the cache is disabled the module is not even serialized.
    /// Fails only if the module cannot be serialized.
    pub fn lookup<M: ModuleSerializer + ?Sized>(&mut self, module: &M) -> Result<Lookup, CacheError> {
        self.pending = Pending::Nothing;
        if !self.settings.enabled {
            self.pending = Pending::Skip;
            return Ok(Lookup::Miss(MissReason::Disabled));
        }
        if !self.is_cacheable(module.module_id()) {
            trace!(module_id = module.module_id(), "module not cacheable");
            self.pending = Pending::Skip;
            return Ok(Lookup::Miss(MissReason::NotCacheable));
        }

        let key = self.key_for(module)?;
        let result = self.lookup_key(&key);
        self.pending = Pending::Key(key);
        Ok(result)
    }

    /// Looks up the entry for an explicit key. Does not touch the pending key.
    pub fn lookup_key(&self, key: &CacheKey) -> Lookup {
        let result = self.probe(key);
        match &result {
            Lookup::Hit(object) => {
                trace!(key = %key, bytes = object.len(), "jit cache hit");
            }
            Lookup::Miss(reason) if reason.is_corruption() => {
                warn!(key = %key, %reason, "corrupt jit cache entry ignored");
            }
            Lookup::Miss(reason) => {
                debug!(key = %key, %reason, "jit cache miss");
            }
        }
        result
    }

    fn probe(&self, key: &CacheKey) -> Lookup {
        if !self.settings.enabled {
            return Lookup::Miss(MissReason::Disabled);
        }
        if !self.is_cacheable(&key.module_id) {
            return Lookup::Miss(MissReason::NotCacheable);
        }

        let paths = EntryPaths::new(&self.settings.root, key);
        if !self.fs.exists(&paths.dir) {
            return Lookup::Miss(MissReason::NoShardDir);
        }

        let header = match self
            .fs
            .read(&paths.header)
            .ok()
            .and_then(|raw| CacheFileHeader::decode(&raw).ok())
        {
            Some(header) => header,
            None => return Lookup::Miss(MissReason::HeaderUnreadable),
        };

        if let Err(mismatch) = header.check(key, self.settings.platform_key) {
            return Lookup::Miss(MissReason::HeaderInvalid(mismatch));
        }

        let object = match self.fs.read(&paths.object) {
            Ok(object) => object,
            Err(_) => return Lookup::Miss(MissReason::ObjectUnreadable),
        };

        let actual = Crc32::from_bytes(&object);
        if actual != header.object_crc() || object.len() as u64 != header.object_size {
            let reason = MissReason::Corrupt {
                expected: header.object_crc(),
                actual,
            };
            self.emit(
                Diagnostic::warning(codes::CORRUPT_ENTRY, "corrupt jit cache entry")
                    .with_path(&paths.object)
                    .with_note(format!(
                        "{reason} ({} bytes read, {} recorded)",
                        object.len(),
                        header.object_size
                    ))
                    .with_help("the module will be recompiled; the entry is left in place"),
            );
            return Lookup::Miss(reason);
        }

        Lookup::Hit(object)
    }

    /// Stores `object` under the key remembered by the last [`lookup`](Self::lookup).
    ///
    /// A no-op when the last lookup was disabled or not cacheable. Consumes
    /// the pending key either way.
    pub fn store(&mut self, object: &[u8]) -> Result<(), CacheError> {
        match std::mem::replace(&mut self.pending, Pending::Nothing) {
            Pending::Key(key) => self.store_key(&key, object),
            Pending::Skip => Ok(()),
            Pending::Nothing => Err(CacheError::NoPendingModule),
        }
    }

    /// Stores `object` under an explicit key.
    ///
    /// Creates the shard directory on demand, then writes the object file and
    /// finally the header, which makes the entry visible to lookups.
    pub fn store_key(&self, key: &CacheKey, object: &[u8]) -> Result<(), CacheError> {
        if !self.settings.enabled || !self.is_cacheable(&key.module_id) {
            return Ok(());
        }

        let paths = EntryPaths::new(&self.settings.root, key);
        if !self.fs.exists(&paths.dir) {
            if let Err(source) = self.fs.create_dir_all(&paths.dir) {
                warn!(dir = %paths.dir.display(), error = %source, "cannot create jit cache directory");
                self.emit(
                    Diagnostic::warning(codes::DIR_CREATE_FAILED, "cannot create jit cache directory")
                        .with_path(&paths.dir)
                        .with_note(source.to_string())
                        .with_help("check that the cache root is writable, or disable the cache"),
                );
                return Err(CacheError::CreateDir {
                    path: paths.dir,
                    source,
                });
            }
        }

        self.write_file(&paths.object, object)?;
        let header = CacheFileHeader::for_object(key, object, self.settings.platform_key);
        self.write_file(&paths.header, &header.encode()?)?;

        debug!(key = %key, bytes = object.len(), "jit cache entry stored");
        Ok(())
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), CacheError> {
        self.fs.write(path, data).map_err(|source| {
            warn!(path = %path.display(), error = %source, "cannot write jit cache file");
            self.emit(
                Diagnostic::warning(codes::STORE_WRITE_FAILED, "cannot write jit cache file")
                    .with_path(path)
                    .with_note(source.to_string()),
            );
            CacheError::Io {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Returns the cached object for `module`, or compiles and caches it.
    ///
    /// `compile` runs only on a miss. A failed store is reported through
    /// tracing and the diagnostic sink but never fails the compilation.
    pub fn compile_with_cache<M, E, C>(&mut self, module: &M, compile: C) -> Result<Compiled, E>
    where
        M: ModuleSerializer + ?Sized,
        C: FnOnce(&M) -> Result<Vec<u8>, E>,
        E: From<CacheError>,
    {
        match self.lookup(module)? {
            Lookup::Hit(object) => {
                self.pending = Pending::Nothing;
                return Ok(Compiled {
                    object,
                    from_cache: true,
                });
            }
            Lookup::Miss(_) => {}
        }

        let object = compile(module)?;
        if let Err(e) = self.store(&object) {
            debug!(module_id = module.module_id(), error = %e, "compiled object not cached");
        }
        Ok(Compiled {
            object,
            from_cache: false,
        })
    }

    fn emit(&self, diag: Diagnostic) {
        if let Some(sink) = &self.sink {
            sink.emit(diag);
        }
    }
}
