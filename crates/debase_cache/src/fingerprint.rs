//! Fingerprint computation.
//!
//! Hash order is fixed: domain tag, tool binary bytes, target bytes,
//! manifest bytes, then each configuration string. Every section is
//! length-framed. Full file contents are always read; modification times
//! are never consulted.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use debase_common::{ContentHash, ContentHasher, ParseHashError};

use crate::error::CacheError;

/// Domain tag mixed into every fingerprint. Bump to invalidate all sidecars.
const DOMAIN: &str = "debase-build/fingerprint/v1";

/// Everything that feeds a fingerprint.
#[derive(Debug, Clone, Copy)]
pub struct FingerprintInputs<'a> {
    /// The debase tool binary.
    pub tool: &'a Path,
    /// The target module.
    pub target: &'a Path,
    /// The manifest produced by the last debase run.
    pub manifest: &'a Path,
    /// Build-affecting configuration values, in a stable order.
    pub config: &'a [String],
}

/// An opaque digest of the debase stage's inputs and last output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(ContentHash);

impl Fingerprint {
    /// Computes the fingerprint, reading all three files in full.
    pub fn compute(inputs: &FingerprintInputs<'_>) -> Result<Self, CacheError> {
        let mut hasher = ContentHasher::new(DOMAIN);
        for path in [inputs.tool, inputs.target, inputs.manifest] {
            let bytes = std::fs::read(path).map_err(|e| CacheError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            hasher.section(&bytes);
        }
        for value in inputs.config {
            hasher.section(value.as_bytes());
        }
        Ok(Self(hasher.finish()))
    }

    /// Exact equality between a stored and a recomputed fingerprint.
    pub fn is_valid(stored: &Fingerprint, recomputed: &Fingerprint) -> bool {
        stored == recomputed
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Fingerprint {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentHash::from_hex(s).map(Self)
    }
}
