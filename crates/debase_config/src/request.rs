//! The immutable build request.
//!
//! Raw command-line values are collected into [`RequestOptions`] and
//! normalized exactly once by [`BuildRequest::new`]: paths become absolute,
//! `;`-separated lists are split, and the publish mode is fixed.

use std::path::{Path, PathBuf};

use debase_common::{BuildProfile, FramePointer};

use crate::error::ConfigError;

/// Separator used for input file lists and passthrough flags.
const LIST_SEPARATOR: char = ';';

/// Subdirectory of the output directory that receives debase output.
const LIB_SUBDIR: &str = "lib";

/// Subdirectory of the output directory that receives object files.
const OPT_SUBDIR: &str = "opt";

/// Extension of the default response file.
const RESPONSE_EXT: &str = "rsp";

/// Unvalidated inputs for a [`BuildRequest`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Target module, relative to the output directory.
    pub target: String,
    /// Output directory; defaults to the current directory.
    pub output_dir: Option<PathBuf>,
    /// Build profile.
    pub profile: BuildProfile,
    /// Frame-pointer policy for the size and speed profiles.
    pub frame_pointer: FramePointer,
    /// Input files; each entry may hold several `;`-separated paths.
    pub files: Vec<String>,
    /// `;`-separated flags forwarded to the debase tool.
    pub passthrough: String,
    /// File name of the manifest written by the debase tool.
    pub manifest_name: String,
    /// Archive mode, with an optional archive name override.
    pub archive: Option<String>,
    /// Response file name or path.
    pub response: Option<String>,
}

/// How the successfully lowered objects are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishMode {
    /// Write a space-separated response file at this path.
    ResponseFile(PathBuf),
    /// Re-invoke the debase tool in archive-only mode.
    Archive {
        /// Optional archive name override.
        name: Option<String>,
    },
}

/// A validated, immutable build request for one target.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    target: PathBuf,
    output_dir: PathBuf,
    profile: BuildProfile,
    frame_pointer: FramePointer,
    files: Vec<PathBuf>,
    passthrough: Vec<String>,
    manifest_name: String,
    publish: PublishMode,
}

impl BuildRequest {
    /// Validates and normalizes the raw options.
    pub fn new(opts: RequestOptions) -> Result<Self, ConfigError> {
        if opts.target.is_empty() {
            return Err(ConfigError::Missing("target"));
        }
        if opts.manifest_name.is_empty() {
            return Err(ConfigError::Missing("output filename"));
        }
        if opts.archive.is_some() && opts.response.is_some() {
            return Err(ConfigError::Invalid(
                "an archive and a response file cannot both be requested".to_string(),
            ));
        }

        let output_dir = match opts.output_dir {
            Some(dir) => std::path::absolute(dir)?,
            None => std::env::current_dir()?,
        };

        let mut files = Vec::new();
        for entry in &opts.files {
            for file in split_list(entry) {
                files.push(std::path::absolute(file)?);
            }
        }

        let passthrough = split_list(&opts.passthrough)
            .map(str::to_string)
            .collect();

        let target = PathBuf::from(&opts.target);
        let publish = match (opts.archive, opts.response) {
            (Some(name), _) => PublishMode::Archive {
                name: Some(name).filter(|n| !n.is_empty()),
            },
            (None, Some(rsp)) if !rsp.is_empty() => {
                PublishMode::ResponseFile(output_dir.join(rsp))
            }
            (None, _) => PublishMode::ResponseFile(default_response_path(&output_dir, &target)),
        };

        Ok(Self {
            target,
            output_dir,
            profile: opts.profile,
            frame_pointer: opts.frame_pointer,
            files,
            passthrough,
            manifest_name: opts.manifest_name,
            publish,
        })
    }

    /// The target module as given, relative to the output directory.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// The absolute output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The build profile.
    pub fn profile(&self) -> BuildProfile {
        self.profile
    }

    /// The requested frame-pointer policy.
    pub fn frame_pointer(&self) -> FramePointer {
        self.frame_pointer
    }

    /// Absolute input file paths in command-line order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Flags forwarded verbatim to the debase tool.
    pub fn passthrough(&self) -> &[String] {
        &self.passthrough
    }

    /// File name of the manifest inside [`lib_dir`](Self::lib_dir).
    pub fn manifest_name(&self) -> &str {
        &self.manifest_name
    }

    /// The selected publish mode.
    pub fn publish(&self) -> &PublishMode {
        &self.publish
    }

    /// Absolute path of the target module.
    pub fn target_path(&self) -> PathBuf {
        self.output_dir.join(&self.target)
    }

    /// Directory the debase tool writes bytecode and the manifest into.
    pub fn lib_dir(&self) -> PathBuf {
        self.output_dir.join(LIB_SUBDIR)
    }

    /// Expected location of the manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.lib_dir().join(&self.manifest_name)
    }

    /// Directory object files are written into.
    pub fn opt_dir(&self) -> PathBuf {
        self.output_dir.join(OPT_SUBDIR)
    }

    /// Object path for a unit, relative to the output directory.
    pub fn object_for(&self, unit: &Path) -> PathBuf {
        let stem = unit.file_stem().unwrap_or(unit.as_os_str());
        let mut name = stem.to_os_string();
        name.push(".o");
        Path::new(OPT_SUBDIR).join(name)
    }

    /// Configuration values that affect the debase stage's output.
    ///
    /// Fed into the build fingerprint in this order: frame-pointer policy,
    /// passthrough flags, input file list.
    pub fn config_strings(&self) -> Vec<String> {
        let files: Vec<String> = self
            .files
            .iter()
            .map(|f| f.to_string_lossy().into_owned())
            .collect();
        vec![
            self.frame_pointer.to_string(),
            self.passthrough.join(";"),
            files.join(";"),
        ]
    }
}

/// Splits a `;`-separated list, dropping empty segments.
fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(LIST_SEPARATOR).filter(|part| !part.is_empty())
}

/// `<output_dir>/<target stem>.rsp`.
fn default_response_path(output_dir: &Path, target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "objects".to_string());
    output_dir.join(format!("{stem}.{RESPONSE_EXT}"))
}
