//! The first pipeline stage: run the debase tool unless the cache is fresh.

use std::path::{Path, PathBuf};

use debase_cache::{FingerprintInputs, FingerprintStore};
use debase_config::BuildRequest;

use crate::error::DriverError;
use crate::process::{Invocation, ProcessRunner};

/// Flags always passed to the debase tool, ahead of user passthrough flags.
const POLICY_FLAGS: [&str; 3] = ["--emit-all", "--allow-no-builtins", "--permissive"];

/// Result of the debase stage.
#[derive(Debug, Clone)]
pub struct DebaseOutcome {
    /// Location of the manifest to hand to the lowering stage.
    pub manifest_path: PathBuf,
    /// The tool invocation, or `None` if the fingerprint matched and the tool was skipped.
    pub invocation: Option<Invocation>,
}

impl DebaseOutcome {
    /// Returns `true` if the tool was skipped.
    pub fn cached(&self) -> bool {
        self.invocation.is_none()
    }
}

/// Runs the debase tool for one build request.
pub struct DebaseStage<'a, R: ProcessRunner + ?Sized> {
    runner: &'a R,
    tool: &'a Path,
}

impl<'a, R: ProcessRunner + ?Sized> DebaseStage<'a, R> {
    /// Creates the stage for the debase binary at `tool`.
    pub fn new(runner: &'a R, tool: &'a Path) -> Self {
        Self { runner, tool }
    }

    /// Builds the tool invocation for `request`.
    ///
    /// `<tool> <target> -o <lib> --output-filenames=<name> <policy> <passthrough> <files>`,
    /// run from the output directory.
    pub fn invocation(&self, request: &BuildRequest) -> Invocation {
        Invocation::new(self.tool, request.output_dir())
            .arg(request.target_path())
            .arg("-o")
            .arg(request.lib_dir())
            .arg(format!("--output-filenames={}", request.manifest_name()))
            .args(POLICY_FLAGS)
            .args(request.passthrough())
            .args(request.files())
    }

    /// Runs the stage.
    ///
    /// Skips the tool when both the manifest and the fingerprint sidecar exist
    /// and the recomputed fingerprint matches. Otherwise runs the tool once and
    /// rewrites the sidecar from the fresh manifest.
    pub fn run(&self, request: &BuildRequest) -> Result<DebaseOutcome, DriverError> {
        let target = request.target_path();
        if !target.exists() {
            return Err(DriverError::TargetMissing { path: target });
        }

        let manifest_path = request.manifest_path();
        let store = FingerprintStore::for_target(request.output_dir(), request.target());
        let config = request.config_strings();
        let inputs = FingerprintInputs {
            tool: self.tool,
            target: &target,
            manifest: &manifest_path,
            config: &config,
        };

        if manifest_path.is_file() && store.exists() && store.is_fresh(&inputs) {
            return Ok(DebaseOutcome {
                manifest_path,
                invocation: None,
            });
        }

        let lib_dir = request.lib_dir();
        std::fs::create_dir_all(&lib_dir).map_err(|e| DriverError::Io {
            path: lib_dir,
            source: e,
        })?;

        let invocation = self.invocation(request);
        self.runner.run(&invocation)?.check(&invocation)?;

        if !manifest_path.is_file() {
            return Err(DriverError::ManifestNotWritten {
                path: manifest_path,
            });
        }
        store.refresh(&inputs)?;

        Ok(DebaseOutcome {
            manifest_path,
            invocation: Some(invocation),
        })
    }
}
