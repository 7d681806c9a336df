//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Lookups never return most of these: a missing, foreign or damaged entry
/// is reported as a miss. Errors surface from module serialization (no key
/// can be computed) and from stores (the entry could not be written).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while writing or scanning cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A cache directory could not be created.
    #[error("cannot create cache directory {path}: {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The module could not be serialized, so no cache key exists for it.
    #[error("failed to serialize module '{module_id}': {reason}")]
    Serialization {
        /// Id of the module that failed to serialize.
        module_id: String,
        /// Description of the serialization failure.
        reason: String,
    },

    /// A cache file header could not be decoded.
    #[error("invalid cache header: {reason}")]
    InvalidHeader {
        /// Description of the header problem.
        reason: String,
    },

    /// A cache file header could not be encoded.
    #[error("cannot encode cache header: {reason}")]
    HeaderEncode {
        /// Description of the encoding failure.
        reason: String,
    },

    /// `store` was called without a preceding `lookup` to supply the key.
    #[error("no pending module to store: call lookup first")]
    NoPendingModule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/cache/1/2/3/4/JM_a.obj"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("JM_a.obj"));
    }

    #[test]
    fn create_dir_display() {
        let err = CacheError::CreateDir {
            path: PathBuf::from("/ro/1/2/3/4"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cannot create cache directory"));
        assert!(msg.contains("read-only"));
    }

    #[test]
    fn serialization_display() {
        let err = CacheError::Serialization {
            module_id: "JM_fetch".to_string(),
            reason: "dangling reference".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to serialize module 'JM_fetch': dangling reference"
        );
    }

    #[test]
    fn invalid_header_display() {
        let err = CacheError::InvalidHeader {
            reason: "unexpected end of input".to_string(),
        };
        assert!(err.to_string().contains("unexpected end of input"));
    }

    #[test]
    fn no_pending_display() {
        assert!(CacheError::NoPendingModule.to_string().contains("lookup first"));
    }
}
