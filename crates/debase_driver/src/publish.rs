//! The terminal step: publish the lowered objects.

use std::path::{Path, PathBuf};

use debase_config::{BuildRequest, PublishMode};

use crate::error::DriverError;
use crate::process::{Invocation, ProcessRunner};

/// What the publisher produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    /// A response file was written at this path.
    ResponseFile(PathBuf),
    /// The debase tool archived the objects.
    Archive {
        /// The archive name override, if one was given.
        name: Option<String>,
        /// Anything the archiver wrote to stderr despite succeeding.
        stderr: String,
    },
}

/// Publishes a successful object list as a response file or an archive.
pub struct OutputPublisher<'a, R: ProcessRunner + ?Sized> {
    runner: &'a R,
    debase_tool: &'a Path,
}

impl<'a, R: ProcessRunner + ?Sized> OutputPublisher<'a, R> {
    /// Creates the publisher; archives are produced by `debase_tool`.
    pub fn new(runner: &'a R, debase_tool: &'a Path) -> Self {
        Self {
            runner,
            debase_tool,
        }
    }

    /// Publishes `objects` (relative to the output directory) as the request asks.
    pub fn publish(
        &self,
        request: &BuildRequest,
        objects: &[PathBuf],
    ) -> Result<Published, DriverError> {
        match request.publish() {
            PublishMode::ResponseFile(path) => {
                write_response_file(path, objects)?;
                Ok(Published::ResponseFile(path.clone()))
            }
            PublishMode::Archive { name } => {
                let invocation = self.archive_invocation(request, name.as_deref(), objects);
                let output = self.runner.run(&invocation)?.check(&invocation)?;
                Ok(Published::Archive {
                    name: name.clone(),
                    stderr: output.stderr,
                })
            }
        }
    }

    /// `<tool> --archive-only[=<name>] --permissive -o <output_dir> <objects...>`,
    /// run from the output directory.
    pub fn archive_invocation(
        &self,
        request: &BuildRequest,
        name: Option<&str>,
        objects: &[PathBuf],
    ) -> Invocation {
        let archive_only = match name {
            Some(name) => format!("--archive-only={name}"),
            None => "--archive-only".to_string(),
        };
        Invocation::new(self.debase_tool, request.output_dir())
            .arg(archive_only)
            .arg("--permissive")
            .arg("-o")
            .arg(request.output_dir())
            .args(objects)
    }
}

/// Writes the objects space-separated, in the order given.
fn write_response_file(path: &Path, objects: &[PathBuf]) -> Result<(), DriverError> {
    let content = objects
        .iter()
        .map(|o| o.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    std::fs::write(path, content).map_err(|e| DriverError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
