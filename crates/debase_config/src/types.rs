//! Configuration types deserialized from `debase.toml`.

use debase_common::{BuildProfile, FramePointer};
use serde::Deserialize;

/// The top-level driver configuration.
///
/// Every section is optional; a missing file is equivalent to an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct DriverConfig {
    /// Locations of the external tools.
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Defaults for the build request.
    #[serde(default)]
    pub build: BuildConfig,
    /// Lowering loop settings.
    #[serde(default)]
    pub lower: LowerConfig,
}

/// External tool locations. Bare names are looked up on `PATH`.
#[derive(Debug, Deserialize)]
pub struct ToolsConfig {
    /// The first-stage debase tool.
    #[serde(default = "default_debase")]
    pub debase: String,
    /// The lowering compiler.
    #[serde(default = "default_llc")]
    pub llc: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            debase: default_debase(),
            llc: default_llc(),
        }
    }
}

/// Build request defaults, overridable on the command line.
#[derive(Debug, Deserialize)]
pub struct BuildConfig {
    /// The build profile.
    #[serde(default)]
    pub profile: BuildProfile,
    /// Frame-pointer policy for the size and speed profiles.
    #[serde(default)]
    pub frame_pointer: FramePointer,
    /// File name of the manifest the debase tool writes into `lib/`.
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            profile: BuildProfile::default(),
            frame_pointer: FramePointer::default(),
            manifest: default_manifest(),
        }
    }
}

/// Lowering loop settings.
#[derive(Debug, Deserialize)]
pub struct LowerConfig {
    /// Register allocator passed as `--regalloc=<value>`; empty disables the flag.
    #[serde(default = "default_regalloc")]
    pub regalloc: String,
    /// Number of units lowered concurrently.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            regalloc: default_regalloc(),
            jobs: default_jobs(),
        }
    }
}

fn default_debase() -> String {
    "debase".to_string()
}

fn default_llc() -> String {
    "llc".to_string()
}

fn default_manifest() -> String {
    "debase.json".to_string()
}

fn default_regalloc() -> String {
    "pbqp".to_string()
}

fn default_jobs() -> usize {
    1
}
