//! Mapping of cache keys to sharded on-disk paths.
//!
//! Entries live four directory levels below the cache root, one level per
//! byte of the module CRC, so no single directory collects every entry.

use std::path::{Path, PathBuf};

use jitc_common::Crc32;

use crate::key::CacheKey;

/// Extension appended to the header path to name the object file.
pub const OBJECT_EXTENSION: &str = "obj";

/// Returns `<root>/<b0>/<b1>/<b2>/<b3>` for the little-endian bytes of `crc`.
///
/// Pure: nothing is created or checked on disk.
pub fn shard_dir(root: &Path, crc: Crc32) -> PathBuf {
    let mut dir = root.to_path_buf();
    for byte in crc.to_le_bytes() {
        dir.push(byte.to_string());
    }
    dir
}

/// The directory and file paths of one cache entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPaths {
    /// The shard directory holding both files.
    pub dir: PathBuf,
    /// `<dir>/<module_id>`: the header file.
    pub header: PathBuf,
    /// `<dir>/<module_id>.obj`: the object file.
    pub object: PathBuf,
}

impl EntryPaths {
    /// Computes the paths of the entry for `key` under `root`.
    ///
    /// The file name is the full module id, untruncated.
    pub fn new(root: &Path, key: &CacheKey) -> Self {
        let dir = shard_dir(root, key.module_crc);
        let header = dir.join(&key.module_id);
        let object = object_path(&header);
        Self {
            dir,
            header,
            object,
        }
    }
}

/// Appends the object extension to a header path.
pub fn object_path(header: &Path) -> PathBuf {
    let mut name = header.as_os_str().to_os_string();
    name.push(".");
    name.push(OBJECT_EXTENSION);
    PathBuf::from(name)
}

/// Returns `true` if `module_id` can safely name a file inside a shard directory.
///
/// Dot-prefixed names are reserved for temporary files, and a name ending in
/// `.obj` would collide with another module's object file in the same shard.
pub fn is_valid_file_name(module_id: &str) -> bool {
    !module_id.is_empty()
        && !module_id.starts_with('.')
        && !is_object_file_name(module_id)
        && !module_id.contains(['/', '\\', '\0'])
}

/// Returns `true` if `name` has the object file extension.
pub(crate) fn is_object_file_name(name: &str) -> bool {
    name.strip_suffix(OBJECT_EXTENSION)
        .is_some_and(|stem| stem.ends_with('.'))
}
