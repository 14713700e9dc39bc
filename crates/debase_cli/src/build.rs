//! `debase-build build`: debase, lower and publish one target.
//!
//! Resolves the configuration, normalizes the arguments into a
//! [`BuildRequest`], then drives the pipeline stage by stage so progress can
//! be reported between them.

use std::path::{Path, PathBuf};

use debase_config::{BuildRequest, DriverConfig, RequestOptions, CONFIG_FILE};
use debase_diagnostics::{
    Diagnostic, DiagnosticRenderer, DiagnosticSink, Severity, TerminalRenderer,
};
use debase_driver::{
    BuildOutcome, DebaseOutcome, DriverError, Invocation, LowerOptions, Pipeline, ProcessOutput,
    ProcessRunner, Published, SystemRunner, Toolchain,
};

use crate::{BuildArgs, GlobalArgs, ReportFormat};

/// Runs the `debase-build build` command.
///
/// Returns the exit code: 0 on success, the failing tool's own code when an
/// external tool fails, 1 for everything else.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = resolve_config(args, global)?;
    let request = BuildRequest::new(request_options(args, &config))?;
    let toolchain = Toolchain::resolve(
        args.debase_bin.as_deref().unwrap_or(&config.tools.debase),
        args.llc_bin.as_deref().unwrap_or(&config.tools.llc),
    );
    let lower_options = lower_options(args, &config);
    let runner = EchoingRunner {
        inner: SystemRunner,
        echo: global.verbose,
    };
    Ok(execute(&runner, &request, &toolchain, &lower_options, args, global))
}

/// Loads `--config` if given, else `<output dir>/debase.toml` if present,
/// else the built-in defaults.
fn resolve_config(
    args: &BuildArgs,
    global: &GlobalArgs,
) -> Result<DriverConfig, Box<dyn std::error::Error>> {
    if let Some(path) = &global.config {
        return Ok(debase_config::load_config(Path::new(path))?);
    }
    let output_dir = args
        .output_dir
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_default();
    let candidate = output_dir.join(CONFIG_FILE);
    if candidate.is_file() {
        Ok(debase_config::load_config(&candidate)?)
    } else {
        Ok(DriverConfig::default())
    }
}

/// Merges command-line values over the configuration file.
fn request_options(args: &BuildArgs, config: &DriverConfig) -> RequestOptions {
    RequestOptions {
        target: args.target.clone(),
        output_dir: args.output_dir.as_deref().map(PathBuf::from),
        profile: args
            .build_type
            .map(Into::into)
            .unwrap_or(config.build.profile),
        frame_pointer: args
            .frame_pointer
            .map(Into::into)
            .unwrap_or(config.build.frame_pointer),
        files: args.files.clone(),
        passthrough: args.passthrough.clone(),
        manifest_name: args
            .output_filenames
            .clone()
            .unwrap_or_else(|| config.build.manifest.clone()),
        archive: args.archive.clone(),
        response: args.rsp.clone(),
    }
}

fn lower_options(args: &BuildArgs, config: &DriverConfig) -> LowerOptions {
    let regalloc = &config.lower.regalloc;
    LowerOptions {
        regalloc: (!regalloc.is_empty()).then(|| regalloc.clone()),
        jobs: args.jobs.unwrap_or(config.lower.jobs).max(1),
    }
}

/// Drives the pipeline and reports progress; returns the exit code.
fn execute<R: ProcessRunner>(
    runner: &R,
    request: &BuildRequest,
    toolchain: &Toolchain,
    lower_options: &LowerOptions,
    args: &BuildArgs,
    global: &GlobalArgs,
) -> i32 {
    let sink = DiagnosticSink::new();
    let pipeline = Pipeline::new(runner, toolchain, lower_options, &sink);

    match run_stages(&pipeline, request, args, global) {
        Ok(outcome) => {
            report_published(request, &outcome, global);
            render_and_report(&sink, None, args, global);
            0
        }
        Err(err) => {
            render_and_report(&sink, Some(&err), args, global);
            err.exit_code()
        }
    }
}

fn run_stages<R: ProcessRunner>(
    pipeline: &Pipeline<'_, R>,
    request: &BuildRequest,
    args: &BuildArgs,
    global: &GlobalArgs,
) -> Result<BuildOutcome, DriverError> {
    let target = request.target().display();

    let debase = pipeline.debase(request)?;
    if args.dump {
        if let Some(line) = debase_dump(&debase) {
            println!("{line}");
        }
    }
    if !global.quiet {
        if debase.cached() {
            eprintln!("     Fresh {target}");
        } else {
            eprintln!("   Debasing {target}");
        }
    }

    let lower = pipeline.lower(request, &debase)?;
    if !global.quiet {
        eprintln!(
            "   Lowering {} unit(s) ({})",
            lower.total,
            request.profile()
        );
    }
    if args.dump {
        for object in &lower.objects {
            println!("{}", object.display());
        }
    }

    let published = pipeline.publish(request, &lower)?;
    Ok(BuildOutcome {
        debase,
        lower,
        published,
    })
}

/// The `-D` line for the debase stage, present only when the tool ran.
fn debase_dump(debase: &DebaseOutcome) -> Option<String> {
    debase.invocation.as_ref().map(ToString::to_string)
}

fn report_published(request: &BuildRequest, outcome: &BuildOutcome, global: &GlobalArgs) {
    if global.quiet {
        return;
    }
    match &outcome.published {
        Published::ResponseFile(path) => {
            let name = path.strip_prefix(request.output_dir()).unwrap_or(path);
            eprintln!("  Generated response file \"@{}\"", name.display());
        }
        Published::Archive {
            name: Some(name), ..
        } => eprintln!("  Generated archive {name}"),
        Published::Archive { name: None, .. } => eprintln!("  Generated archive"),
    }
}

/// Renders the collected diagnostics, followed by the fatal error if any.
fn render_and_report(
    sink: &DiagnosticSink,
    fatal: Option<&DriverError>,
    args: &BuildArgs,
    global: &GlobalArgs,
) {
    let mut diagnostics = sink.take_all();
    if args.format == ReportFormat::Text && !global.verbose {
        diagnostics.retain(|d| d.severity != Severity::Note);
    }
    if let Some(err) = fatal {
        diagnostics.push(err.to_diagnostic());
    }
    if diagnostics.is_empty() {
        return;
    }

    match args.format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in &diagnostics {
                eprint!("{}", renderer.render(diag));
            }
        }
        ReportFormat::Json => {
            let json =
                serde_json::to_string_pretty(&diagnostics).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!("   Result: {} error(s)", count(&diagnostics, Severity::Error));
    }
}

fn count(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}

/// Prints each invocation before handing it to the wrapped runner.
struct EchoingRunner<R> {
    inner: R,
    echo: bool,
}

impl<R: ProcessRunner> ProcessRunner for EchoingRunner<R> {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, DriverError> {
        if self.echo {
            eprintln!("     Running `{invocation}`");
        }
        self.inner.run(invocation)
    }
}
