//! Filesystem access used by the cache.
//!
//! The cache touches the disk only through [`CacheFs`], so callers can
//! instrument or replace it. [`StdFs`] is the real filesystem;
//! [`CountingFs`] wraps another implementation and counts calls.

use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Prefix of in-flight temporary files. Module ids may not start with a dot,
/// so these never collide with an entry.
pub(crate) const TEMP_PREFIX: &str = ".jitc-tmp";

/// The filesystem operations the cache needs.
pub trait CacheFs {
    /// Returns `true` if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Creates `path` and all missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Reads the whole file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replaces the file at `path` with `data`.
    ///
    /// Readers must observe either the old contents or the new ones, never
    /// a partial write.
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

/// The real filesystem.
///
/// Writes go to a temporary file in the destination directory which is then
/// renamed over the target, so concurrent writers of the same entry race
/// harmlessly.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdFs;

impl CacheFs for StdFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let dir = path.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no parent directory", path.display()),
            )
        })?;
        let mut tmp = tempfile::Builder::new().prefix(TEMP_PREFIX).tempfile_in(dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_data()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Counts the calls made through it before delegating to the wrapped filesystem.
#[derive(Debug, Default)]
pub struct CountingFs<F = StdFs> {
    inner: F,
    reads: AtomicUsize,
    writes: AtomicUsize,
    probes: AtomicUsize,
    dir_creates: AtomicUsize,
}

impl<F: CacheFs> CountingFs<F> {
    /// Wraps `inner`.
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            dir_creates: AtomicUsize::new(0),
        }
    }

    /// Number of `read` calls.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `write` calls.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of `exists` calls.
    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::Relaxed)
    }

    /// Number of `create_dir_all` calls.
    pub fn dir_creates(&self) -> usize {
        self.dir_creates.load(Ordering::Relaxed)
    }

    /// Total number of calls of any kind.
    pub fn total(&self) -> usize {
        self.reads() + self.writes() + self.probes() + self.dir_creates()
    }
}

impl<F: CacheFs> CacheFs for CountingFs<F> {
    fn exists(&self, path: &Path) -> bool {
        self.probes.fetch_add(1, Ordering::Relaxed);
        self.inner.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.dir_creates.fetch_add(1, Ordering::Relaxed);
        self.inner.create_dir_all(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.inner.write(path, data)
    }
}
