//! Errors raised before any tool runs.

use std::path::PathBuf;

/// Problems with `debase.toml` or the command-line request.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the expected schema.
    #[error("invalid debase.toml: {0}")]
    Parse(String),

    /// A required value is empty or absent.
    #[error("no {0} given")]
    Missing(&'static str),

    /// A value is present but unusable.
    #[error("{0}")]
    Invalid(String),

    /// A request path could not be made absolute.
    #[error("cannot resolve path: {0}")]
    Path(#[from] std::io::Error),
}
