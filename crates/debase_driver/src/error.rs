//! Error types for the build pipeline.

use std::path::PathBuf;

use debase_cache::CacheError;
use debase_diagnostics::Diagnostic;

/// Fatal pipeline errors.
///
/// Per-unit lowering failures are absorbed by the lowering loop and only
/// reach this type as [`DriverError::LoweringFailed`] once the batch is done.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The target module does not exist under the output directory.
    #[error("target {} does not exist!", .path.display())]
    TargetMissing {
        /// The expected target path.
        path: PathBuf,
    },

    /// An external tool exited unsuccessfully.
    #[error("failed to run {tool}!")]
    ToolFailed {
        /// Short tool name.
        tool: String,
        /// The tool's exit code; `None` if it was killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// An external tool could not be started.
    #[error("failed to spawn {}: {source}", .program.display())]
    Spawn {
        /// The program that failed to start.
        program: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A filesystem operation failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The debase tool reported success but wrote no manifest.
    #[error("debase did not write its manifest {}", .path.display())]
    ManifestNotWritten {
        /// The expected manifest path.
        path: PathBuf,
    },

    /// The manifest has no `files` entry, or it is null.
    #[error("invalid debase json output: could not find \"files\": [...] in {}", .path.display())]
    ManifestMissingFiles {
        /// The manifest path.
        path: PathBuf,
    },

    /// The manifest is not JSON of the expected shape.
    #[error("invalid debase json output in {}: {reason}", .path.display())]
    ManifestInvalid {
        /// The manifest path.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// At least one unit failed to lower.
    #[error("lowering failed for {failed} of {total} unit(s)")]
    LoweringFailed {
        /// Number of failed units.
        failed: usize,
        /// Number of units in the manifest.
        total: usize,
    },

    /// The lowering worker pool could not be created.
    #[error("failed to start lowering workers: {0}")]
    WorkerPool(String),

    /// Timed out waiting for a path to appear.
    #[error("Timed out waiting for {}", .path.display())]
    WaitTimedOut {
        /// The awaited path.
        path: PathBuf,
    },

    /// The build fingerprint could not be persisted.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl DriverError {
    /// The process exit status for this error.
    ///
    /// A failed tool's own exit code is propagated verbatim; everything the
    /// driver detects itself exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::ToolFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    /// Renders this error as a diagnostic, carrying any captured stderr.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            DriverError::ToolFailed { stderr, .. } => diag.with_note(stderr.trim()),
            DriverError::TargetMissing { path }
            | DriverError::ManifestNotWritten { path }
            | DriverError::ManifestMissingFiles { path }
            | DriverError::ManifestInvalid { path, .. } => diag.with_path(path),
            _ => diag,
        }
    }
}
