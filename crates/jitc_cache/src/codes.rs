//! Diagnostic codes emitted by the cache.

use jitc_diagnostics::{Category, DiagnosticCode};

/// A shard directory could not be created during a store.
pub const DIR_CREATE_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 101);

/// A header matched but the object bytes failed the integrity check.
pub const CORRUPT_ENTRY: DiagnosticCode = DiagnosticCode::new(Category::Warning, 102);

/// An object or header file could not be written during a store.
pub const STORE_WRITE_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 103);

/// An audit found a header file that does not decode.
pub const UNREADABLE_HEADER: DiagnosticCode = DiagnosticCode::new(Category::Warning, 104);

/// An audit found an entry written by a different toolchain or format revision.
pub const FOREIGN_ENTRY: DiagnosticCode = DiagnosticCode::new(Category::Note, 201);
