//! Read-only inspection of a cache directory.
//!
//! Walks the four shard levels under a cache root and classifies every
//! header file it finds. Nothing is modified or deleted: damaged entries are
//! harmless to lookups and get replaced by the next store of the same key.

use std::path::{Path, PathBuf};

use jitc_common::{Crc32, PlatformKey};
use jitc_diagnostics::{Diagnostic, DiagnosticSink};
use serde::Serialize;

use crate::codes;
use crate::error::CacheError;
use crate::header::{fixed_string, CacheFileHeader, CACHE_MAGIC};
use crate::shard::{is_valid_file_name, object_path};

/// Number of directory levels between the cache root and the entry files.
const SHARD_DEPTH: usize = 4;

/// Summary of a cache directory.
#[derive(Debug, Default, Serialize)]
pub struct AuditReport {
    /// Entries a lookup with the matching key would hit.
    pub valid: usize,
    /// Total object bytes held by valid entries.
    pub valid_bytes: u64,
    /// Headers written by another build or format revision.
    pub foreign: Vec<PathBuf>,
    /// Entries whose object is missing or does not match its header, or
    /// whose header sits in the wrong shard or under the wrong name.
    pub corrupt: Vec<PathBuf>,
    /// Header files that could not be read or decoded.
    pub unreadable: Vec<PathBuf>,
}

impl AuditReport {
    /// Total number of header files examined.
    pub fn entries(&self) -> usize {
        self.valid + self.foreign.len() + self.corrupt.len() + self.unreadable.len()
    }

    /// Returns `true` if no corrupt or unreadable entries were found.
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty() && self.unreadable.is_empty()
    }
}

/// How a single header file was classified.
enum Verdict {
    Valid(u64),
    Foreign,
    Corrupt(String),
    Unreadable(String),
}

/// Audits the cache under `root` against the given platform key.
///
/// A missing root yields an empty report. Findings are also emitted into
/// `sink` when one is given.
pub fn audit(
    root: &Path,
    platform_key: PlatformKey,
    sink: Option<&DiagnosticSink>,
) -> Result<AuditReport, CacheError> {
    let mut report = AuditReport::default();
    if !root.is_dir() {
        return Ok(report);
    }

    let mut shards = Vec::new();
    collect_shards(root, Vec::with_capacity(SHARD_DEPTH), &mut shards)?;

    for (dir, crc) in shards {
        for header_path in header_files(&dir)? {
            match classify(&header_path, crc, platform_key) {
                Verdict::Valid(bytes) => {
                    report.valid += 1;
                    report.valid_bytes += bytes;
                }
                Verdict::Foreign => {
                    emit(
                        sink,
                        Diagnostic::note(codes::FOREIGN_ENTRY, "entry from another build")
                            .with_path(&header_path),
                    );
                    report.foreign.push(header_path);
                }
                Verdict::Corrupt(why) => {
                    emit(
                        sink,
                        Diagnostic::warning(codes::CORRUPT_ENTRY, "corrupt jit cache entry")
                            .with_path(&header_path)
                            .with_note(why),
                    );
                    report.corrupt.push(header_path);
                }
                Verdict::Unreadable(why) => {
                    emit(
                        sink,
                        Diagnostic::warning(codes::UNREADABLE_HEADER, "unreadable cache header")
                            .with_path(&header_path)
                            .with_note(why),
                    );
                    report.unreadable.push(header_path);
                }
            }
        }
    }

    Ok(report)
}

fn emit(sink: Option<&DiagnosticSink>, diag: Diagnostic) {
    if let Some(sink) = sink {
        sink.emit(diag);
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Collects every directory exactly `SHARD_DEPTH` levels below `dir` whose
/// path segments are all decimal bytes, along with the CRC they encode.
fn collect_shards(
    dir: &Path,
    bytes: Vec<u8>,
    out: &mut Vec<(PathBuf, Crc32)>,
) -> Result<(), CacheError> {
    if bytes.len() == SHARD_DEPTH {
        let crc = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        out.push((dir.to_path_buf(), Crc32::from_raw(crc)));
        return Ok(());
    }

    let mut children = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let byte = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u8>().ok());
        if let Some(byte) = byte {
            children.push((byte, path));
        }
    }
    children.sort();

    for (byte, path) in children {
        let mut next = bytes.clone();
        next.push(byte);
        collect_shards(&path, next, out)?;
    }
    Ok(())
}

/// Lists the header files in a shard directory, skipping objects and
/// in-flight temporary files. Every name a store can produce is listed.
fn header_files(dir: &Path) -> Result<Vec<PathBuf>, CacheError> {
    let mut headers = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !is_valid_file_name(&name) {
            continue;
        }
        headers.push(path);
    }
    headers.sort();
    Ok(headers)
}

fn classify(header_path: &Path, shard_crc: Crc32, platform_key: PlatformKey) -> Verdict {
    let raw = match std::fs::read(header_path) {
        Ok(raw) => raw,
        Err(e) => return Verdict::Unreadable(e.to_string()),
    };
    let header = match CacheFileHeader::decode(&raw) {
        Ok(header) => header,
        Err(e) => return Verdict::Unreadable(e.to_string()),
    };

    if header.magic != CACHE_MAGIC || header.platform_key() != platform_key {
        return Verdict::Foreign;
    }
    if header.source_crc() != shard_crc {
        return Verdict::Corrupt(format!(
            "source CRC {} does not belong in shard {shard_crc}",
            header.source_crc()
        ));
    }
    let file_name = header_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if header.module_id != fixed_string(&file_name) {
        return Verdict::Corrupt(format!(
            "header names module '{}'",
            header.module_id_lossy()
        ));
    }

    let object = match std::fs::read(object_path(header_path)) {
        Ok(object) => object,
        Err(e) => return Verdict::Corrupt(format!("object file unreadable: {e}")),
    };
    let actual = Crc32::from_bytes(&object);
    if actual != header.object_crc() || object.len() as u64 != header.object_size {
        return Verdict::Corrupt(format!(
            "object CRC {actual} does not match header CRC {}",
            header.object_crc()
        ));
    }

    Verdict::Valid(header.object_size)
}
