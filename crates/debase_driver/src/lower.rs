//! The second pipeline stage: lower every bytecode unit to an object file.
//!
//! Units are independent. A failing unit is reported and the loop moves on,
//! until the number of failures exceeds [`failure_ceiling`], at which point
//! the remaining units are not attempted. Any failure fails the batch.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use debase_config::BuildRequest;
use debase_diagnostics::{Diagnostic, DiagnosticSink};
use rayon::prelude::*;

use crate::error::DriverError;
use crate::process::{Invocation, ProcessRunner};

/// Upper bound on tolerated failures regardless of batch size.
const MAX_TOLERATED_FAILURES: usize = 5;

/// Maximum failures tolerated in a batch of `total` units: `min(total / 3, 5)`.
pub fn failure_ceiling(total: usize) -> usize {
    (total / 3).min(MAX_TOLERATED_FAILURES)
}

/// Lowering loop settings.
#[derive(Debug, Clone)]
pub struct LowerOptions {
    /// Register allocator for `--regalloc=`, if any.
    pub regalloc: Option<String>,
    /// Number of concurrent lowering processes.
    pub jobs: usize,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            regalloc: None,
            jobs: 1,
        }
    }
}

/// A unit the lowering tool rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    /// The bytecode unit.
    pub unit: PathBuf,
    /// The tool's exit code, if it exited normally.
    pub code: Option<i32>,
    /// Captured standard error, or the spawn error.
    pub stderr: String,
}

/// Outcome of a lowering batch.
#[derive(Debug, Clone, Default)]
pub struct LowerReport {
    /// Object paths relative to the output directory, in manifest order.
    pub objects: Vec<PathBuf>,
    /// Failed units, in manifest order.
    pub failures: Vec<UnitFailure>,
    /// Units whose lowering was attempted.
    pub attempted: usize,
    /// Units in the batch.
    pub total: usize,
    /// `true` if the failure ceiling was exceeded and the batch was cut short.
    pub halted: bool,
}

impl LowerReport {
    /// Returns `true` if every unit was lowered.
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty() && self.attempted == self.total
    }
}

enum UnitOutcome {
    Lowered(PathBuf),
    Failed(UnitFailure),
    Skipped,
}

/// Runs the lowering tool over a list of units.
pub struct LowerStage<'a, R: ProcessRunner + ?Sized> {
    runner: &'a R,
    tool: &'a Path,
    options: &'a LowerOptions,
    sink: &'a DiagnosticSink,
}

impl<'a, R: ProcessRunner + ?Sized> LowerStage<'a, R> {
    /// Creates the stage for the lowering binary at `tool`.
    pub fn new(
        runner: &'a R,
        tool: &'a Path,
        options: &'a LowerOptions,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self {
            runner,
            tool,
            options,
            sink,
        }
    }

    /// Builds the invocation for one unit and the object path it produces,
    /// relative to the output directory.
    pub fn invocation(&self, request: &BuildRequest, unit: &Path) -> (Invocation, PathBuf) {
        let object = request.object_for(unit);
        let flags = request.profile().flags(request.frame_pointer());
        let mut invocation = Invocation::new(self.tool, request.opt_dir()).args(flags.to_args());
        if let Some(regalloc) = &self.options.regalloc {
            invocation = invocation.arg(format!("--regalloc={regalloc}"));
        }
        let invocation = invocation
            .arg("-filetype=obj")
            .arg("-o")
            .arg(request.output_dir().join(&object))
            .arg(unit);
        (invocation, object)
    }

    /// Lowers `units` in manifest order.
    ///
    /// Returns `Err` only for setup problems; unit failures are collected in
    /// the report and emitted to the diagnostic sink.
    pub fn run(
        &self,
        request: &BuildRequest,
        units: &[PathBuf],
    ) -> Result<LowerReport, DriverError> {
        let opt_dir = request.opt_dir();
        std::fs::create_dir_all(&opt_dir).map_err(|e| DriverError::Io {
            path: opt_dir,
            source: e,
        })?;

        let outcomes = if self.options.jobs > 1 && units.len() > 1 {
            self.lower_parallel(request, units)?
        } else {
            self.lower_sequential(request, units)
        };
        Ok(self.collect(units.len(), outcomes))
    }

    fn lower_sequential(&self, request: &BuildRequest, units: &[PathBuf]) -> Vec<UnitOutcome> {
        let ceiling = failure_ceiling(units.len());
        let mut failed = 0;
        let mut outcomes = Vec::with_capacity(units.len());
        for unit in units {
            let outcome = self.lower_one(request, unit);
            if matches!(outcome, UnitOutcome::Failed(_)) {
                failed += 1;
            }
            outcomes.push(outcome);
            if failed > ceiling {
                break;
            }
        }
        outcomes
    }

    /// Lowers on a bounded pool, keeping manifest order in the results.
    ///
    /// Unit `i` is skipped only once more than `ceiling` failures are known
    /// at indices below `i`. A sequential run would have stopped before it,
    /// so every unit the sequential loop reaches is still attempted.
    fn lower_parallel(
        &self,
        request: &BuildRequest,
        units: &[PathBuf],
    ) -> Result<Vec<UnitOutcome>, DriverError> {
        let ceiling = failure_ceiling(units.len());
        let failed: Vec<AtomicBool> = units.iter().map(|_| AtomicBool::new(false)).collect();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .build()
            .map_err(|e| DriverError::WorkerPool(e.to_string()))?;

        Ok(pool.install(|| {
            units
                .par_iter()
                .enumerate()
                .map(|(index, unit)| {
                    let earlier = failed[..index]
                        .iter()
                        .filter(|f| f.load(Ordering::SeqCst))
                        .count();
                    if earlier > ceiling {
                        return UnitOutcome::Skipped;
                    }
                    let outcome = self.lower_one(request, unit);
                    if matches!(outcome, UnitOutcome::Failed(_)) {
                        failed[index].store(true, Ordering::SeqCst);
                    }
                    outcome
                })
                .collect()
        }))
    }

    fn lower_one(&self, request: &BuildRequest, unit: &Path) -> UnitOutcome {
        let (invocation, object) = self.invocation(request, unit);
        match self.runner.run(&invocation) {
            Ok(output) if output.success() => UnitOutcome::Lowered(object),
            Ok(output) => UnitOutcome::Failed(UnitFailure {
                unit: unit.to_path_buf(),
                code: output.code,
                stderr: output.stderr,
            }),
            Err(e) => UnitOutcome::Failed(UnitFailure {
                unit: unit.to_path_buf(),
                code: None,
                stderr: e.to_string(),
            }),
        }
    }

    /// Folds per-unit outcomes in manifest order, applying the ceiling the
    /// same way regardless of how the units were scheduled.
    fn collect(&self, total: usize, outcomes: Vec<UnitOutcome>) -> LowerReport {
        let ceiling = failure_ceiling(total);
        let mut report = LowerReport {
            total,
            ..Default::default()
        };

        for outcome in outcomes {
            match outcome {
                UnitOutcome::Lowered(object) => {
                    report.attempted += 1;
                    report.objects.push(object);
                }
                UnitOutcome::Failed(failure) => {
                    report.attempted += 1;
                    self.sink.emit(
                        Diagnostic::error(format!(
                            "failed to run llc on {}!",
                            failure.unit.display()
                        ))
                        .with_path(&failure.unit)
                        .with_note(failure.stderr.trim()),
                    );
                    report.failures.push(failure);
                }
                UnitOutcome::Skipped => {}
            }
            if report.failures.len() > ceiling {
                report.halted = true;
                break;
            }
        }

        if report.halted {
            let skipped = total - report.attempted;
            self.sink.emit(
                Diagnostic::error(format!(
                    "too many lowering failures ({} > {ceiling}), {skipped} unit(s) not attempted",
                    report.failures.len()
                ))
                .with_help("check that the manifest lists valid bytecode units"),
            );
        }
        report
    }
}
