//! Fingerprint sidecar persistence.

use std::path::{Path, PathBuf};

use crate::error::CacheError;
use crate::fingerprint::{Fingerprint, FingerprintInputs};

/// Extension appended to the target's file name to form the sidecar name.
pub const FINGERPRINT_EXT: &str = "xxh3";

/// The sidecar file holding the fingerprint of the last successful debase run.
///
/// Lives at `<output_dir>/<target file name>.xxh3` and contains a single hex
/// token. It is always rewritten whole, never patched.
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    path: PathBuf,
}

impl FingerprintStore {
    /// Returns the store for `target` inside `output_dir`.
    pub fn for_target(output_dir: &Path, target: &Path) -> Self {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| target.to_string_lossy().into_owned());
        Self {
            path: output_dir.join(format!("{name}.{FINGERPRINT_EXT}")),
        }
    }

    /// The sidecar path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the sidecar file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the stored fingerprint.
    pub fn load(&self) -> Result<Fingerprint, CacheError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| CacheError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        content.trim().parse().map_err(|_| CacheError::Malformed {
            path: self.path.clone(),
        })
    }

    /// Overwrites the sidecar with `fingerprint`.
    pub fn save(&self, fingerprint: &Fingerprint) -> Result<(), CacheError> {
        std::fs::write(&self.path, format!("{fingerprint}\n")).map_err(|e| CacheError::Io {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Recomputes the fingerprint and compares it with the stored one.
    ///
    /// Any failure to read the sidecar or an input yields `false`, so the
    /// caller re-runs the tool instead of trusting a stale cache.
    pub fn is_fresh(&self, inputs: &FingerprintInputs<'_>) -> bool {
        let Ok(stored) = self.load() else {
            return false;
        };
        match Fingerprint::compute(inputs) {
            Ok(recomputed) => Fingerprint::is_valid(&stored, &recomputed),
            Err(_) => false,
        }
    }

    /// Computes the fingerprint for `inputs` and persists it.
    pub fn refresh(&self, inputs: &FingerprintInputs<'_>) -> Result<Fingerprint, CacheError> {
        let fingerprint = Fingerprint::compute(inputs)?;
        self.save(&fingerprint)?;
        Ok(fingerprint)
    }
}
