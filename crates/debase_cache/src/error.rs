//! Error types for cache operations.

use std::path::PathBuf;

/// Fingerprint read and write failures.
///
/// Freshness checks swallow these and report a miss; they only reach the
/// caller from [`FingerprintStore::refresh`](crate::FingerprintStore::refresh)
/// and the explicit load and save calls.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A fingerprint input or the sidecar could not be read or written.
    #[error("fingerprint I/O failed for {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The sidecar holds something other than one hex digest.
    #[error("malformed fingerprint in {path}")]
    Malformed {
        /// The sidecar file path.
        path: PathBuf,
    },
}
