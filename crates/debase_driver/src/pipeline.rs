//! The fixed debase → lower → publish pipeline for one target.

use std::path::PathBuf;

use debase_config::BuildRequest;
use debase_diagnostics::{Diagnostic, DiagnosticSink};

use crate::debase::{DebaseOutcome, DebaseStage};
use crate::error::DriverError;
use crate::lower::{LowerOptions, LowerReport, LowerStage};
use crate::manifest::Manifest;
use crate::process::{resolve_program, ProcessRunner};
use crate::publish::{OutputPublisher, Published};

/// Resolved locations of the two external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// The debase tool, also used for archiving.
    pub debase: PathBuf,
    /// The lowering compiler.
    pub llc: PathBuf,
}

impl Toolchain {
    /// Resolves both tool names through `PATH` where needed.
    pub fn resolve(debase: &str, llc: &str) -> Self {
        Self {
            debase: resolve_program(debase),
            llc: resolve_program(llc),
        }
    }
}

/// Everything a successful build produced.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Result of the debase stage.
    pub debase: DebaseOutcome,
    /// Result of the lowering stage.
    pub lower: LowerReport,
    /// What was published.
    pub published: Published,
}

/// Runs the pipeline stages in order. Each stage can also be driven
/// individually so callers can report progress between them.
pub struct Pipeline<'a, R: ProcessRunner + ?Sized> {
    runner: &'a R,
    toolchain: &'a Toolchain,
    lower_options: &'a LowerOptions,
    sink: &'a DiagnosticSink,
}

impl<'a, R: ProcessRunner + ?Sized> Pipeline<'a, R> {
    /// Creates a pipeline.
    pub fn new(
        runner: &'a R,
        toolchain: &'a Toolchain,
        lower_options: &'a LowerOptions,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self {
            runner,
            toolchain,
            lower_options,
            sink,
        }
    }

    /// Runs the debase stage. A skipped run leaves a note in the sink.
    pub fn debase(&self, request: &BuildRequest) -> Result<DebaseOutcome, DriverError> {
        let outcome = DebaseStage::new(self.runner, &self.toolchain.debase).run(request)?;
        if outcome.cached() {
            self.sink.emit(
                Diagnostic::note(format!(
                    "{} is unchanged, debase skipped",
                    request.target().display()
                ))
                .with_path(&outcome.manifest_path),
            );
        }
        Ok(outcome)
    }

    /// Reads the manifest and lowers every unit it names.
    ///
    /// Any unit failure turns into [`DriverError::LoweringFailed`]; the
    /// objects that did lower are left on disk but not returned.
    pub fn lower(
        &self,
        request: &BuildRequest,
        debase: &DebaseOutcome,
    ) -> Result<LowerReport, DriverError> {
        let manifest = Manifest::load(&debase.manifest_path)?;
        let units = manifest.resolve_units(request.output_dir());
        let report = LowerStage::new(
            self.runner,
            &self.toolchain.llc,
            self.lower_options,
            self.sink,
        )
        .run(request, &units)?;

        if !report.succeeded() {
            return Err(DriverError::LoweringFailed {
                failed: report.failures.len(),
                total: report.total,
            });
        }
        Ok(report)
    }

    /// Publishes the lowered objects.
    ///
    /// Output the archiver writes to stderr on success becomes a warning.
    pub fn publish(
        &self,
        request: &BuildRequest,
        report: &LowerReport,
    ) -> Result<Published, DriverError> {
        let published = OutputPublisher::new(self.runner, &self.toolchain.debase)
            .publish(request, &report.objects)?;
        if let Published::Archive { stderr, .. } = &published {
            if !stderr.trim().is_empty() {
                self.sink.emit(
                    Diagnostic::warning("the archiver reported problems")
                        .with_note(stderr.trim()),
                );
            }
        }
        Ok(published)
    }

    /// Runs all three stages.
    pub fn run(&self, request: &BuildRequest) -> Result<BuildOutcome, DriverError> {
        let debase = self.debase(request)?;
        let lower = self.lower(request, &debase)?;
        let published = self.publish(request, &lower)?;
        Ok(BuildOutcome {
            debase,
            lower,
            published,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolchain_keeps_explicit_paths() {
        let tc = Toolchain::resolve("/opt/debase", "./llc");
        assert_eq!(tc.debase, PathBuf::from("/opt/debase"));
        assert_eq!(tc.llc, PathBuf::from("./llc"));
    }
}
