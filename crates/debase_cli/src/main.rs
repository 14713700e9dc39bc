//! debase-build: the command-line driver for the debase → llc pipeline.
//!
//! Provides `debase-build build` to debase a target module, lower every
//! bytecode unit to an object file, and publish the objects as a response
//! file or archive, and `debase-build wait` to block until a path appears.

#![warn(missing_docs)]

mod build;
mod wait;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use debase_common::{BuildProfile, FramePointer};

/// debase-build: cached debase and parallel lowering in one step.
#[derive(Parser, Debug)]
#[command(name = "debase-build", version, about = "Debase build driver")]
pub struct Cli {
    /// Only print diagnostics.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print every tool invocation before it runs.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// When to color diagnostic labels.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `debase.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// What to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Debase a target, lower its units and publish the objects.
    Build(BuildArgs),
    /// Wait for a path to appear.
    Wait(WaitArgs),
}

/// Arguments for the `debase-build build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Input files passed to debase; each value may hold `;`-separated paths.
    pub files: Vec<String>,

    /// Target module, relative to the output directory.
    #[arg(long, visible_alias = "target-name")]
    pub target: String,

    /// Build profile (overrides `debase.toml`).
    #[arg(long = "build-type", value_enum)]
    pub build_type: Option<CliProfile>,

    /// Frame-pointer policy for MinSizeRel and Release builds.
    #[arg(long, value_enum)]
    pub frame_pointer: Option<CliFramePointer>,

    /// Output directory (default: current directory).
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// File name of the manifest debase writes (overrides `debase.toml`).
    #[arg(long = "output-filenames", visible_alias = "output-filename")]
    pub output_filenames: Option<String>,

    /// `;`-separated flags forwarded to debase.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub passthrough: String,

    /// Archive the objects with debase instead of writing a response file.
    #[arg(long, num_args = 0..=1, default_missing_value = "", conflicts_with = "rsp")]
    pub archive: Option<String>,

    /// Response file name, relative to the output directory.
    #[arg(long, visible_alias = "rsp-name")]
    pub rsp: Option<String>,

    /// Print the debase invocation and the object list to stdout.
    #[arg(short = 'D', long)]
    pub dump: bool,

    /// debase tool (overrides `debase.toml`).
    #[arg(long)]
    pub debase_bin: Option<String>,

    /// llc tool (overrides `debase.toml`).
    #[arg(long)]
    pub llc_bin: Option<String>,

    /// Number of units lowered concurrently (overrides `debase.toml`).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `debase-build wait` subcommand.
#[derive(Parser, Debug)]
pub struct WaitArgs {
    /// Path to wait for.
    #[arg(long)]
    pub target: String,

    /// Seconds to wait before giving up.
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

/// Build profile as spelled on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliProfile {
    /// No optimization.
    #[value(name = "Debug")]
    Debug,
    /// Optimized, keeping non-leaf frame pointers.
    #[value(name = "RelWithDebInfo")]
    RelWithDebInfo,
    /// Optimized for size.
    #[value(name = "MinSizeRel")]
    MinSizeRel,
    /// Fully optimized.
    #[value(name = "Release")]
    Release,
}

impl From<CliProfile> for BuildProfile {
    fn from(cli: CliProfile) -> Self {
        match cli {
            CliProfile::Debug => BuildProfile::Debug,
            CliProfile::RelWithDebInfo => BuildProfile::RelWithDebInfo,
            CliProfile::MinSizeRel => BuildProfile::MinSizeRel,
            CliProfile::Release => BuildProfile::Release,
        }
    }
}

/// Frame-pointer policy as spelled on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliFramePointer {
    /// Keep all frame pointers.
    All,
    /// Keep frame pointers in non-leaf functions.
    NonLeaf,
    /// Omit frame pointers.
    None,
}

impl From<CliFramePointer> for FramePointer {
    fn from(cli: CliFramePointer) -> Self {
        match cli {
            CliFramePointer::All => FramePointer::All,
            CliFramePointer::NonLeaf => FramePointer::NonLeaf,
            CliFramePointer::None => FramePointer::None,
        }
    }
}

/// `--color` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when stderr is a terminal.
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Flags shared by every subcommand, resolved once in `main`.
pub struct GlobalArgs {
    /// Suppress status lines.
    pub quiet: bool,
    /// Whether to print tool invocations.
    pub verbose: bool,
    /// Color diagnostic labels.
    pub color: bool,
    /// Explicit `debase.toml` path.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => stderr_is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Wait(ref args) => wait::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn stderr_is_terminal() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn build_args(cli: Cli) -> BuildArgs {
        match cli.command {
            Command::Build(args) => args,
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_build_minimal() {
        let args = build_args(Cli::parse_from(["debase-build", "build", "--target", "game.dll"]));
        assert_eq!(args.target, "game.dll");
        assert!(args.files.is_empty());
        assert!(args.build_type.is_none());
        assert!(args.frame_pointer.is_none());
        assert!(args.archive.is_none());
        assert!(args.rsp.is_none());
        assert_eq!(args.passthrough, "");
        assert!(!args.dump);
        assert_eq!(args.format, ReportFormat::Text);
    }

    #[test]
    fn parse_build_full() {
        let args = build_args(Cli::parse_from([
            "debase-build",
            "build",
            "--target-name",
            "game.dll",
            "--build-type",
            "MinSizeRel",
            "--frame-pointer",
            "non-leaf",
            "-o",
            "/out",
            "--output-filename",
            "units.json",
            "--passthrough",
            "--strip;--fast",
            "--rsp-name",
            "link.rsp",
            "-D",
            "-j",
            "8",
            "/refs/a.dll;/refs/b.dll",
            "/refs/c.dll",
        ]));
        assert_eq!(args.target, "game.dll");
        assert_eq!(args.build_type, Some(CliProfile::MinSizeRel));
        assert_eq!(args.frame_pointer, Some(CliFramePointer::NonLeaf));
        assert_eq!(args.output_dir.as_deref(), Some("/out"));
        assert_eq!(args.output_filenames.as_deref(), Some("units.json"));
        assert_eq!(args.passthrough, "--strip;--fast");
        assert_eq!(args.rsp.as_deref(), Some("link.rsp"));
        assert!(args.dump);
        assert_eq!(args.jobs, Some(8));
        assert_eq!(args.files, vec!["/refs/a.dll;/refs/b.dll", "/refs/c.dll"]);
    }

    #[test]
    fn parse_archive_without_name() {
        let args = build_args(Cli::parse_from([
            "debase-build",
            "build",
            "--target",
            "game.dll",
            "--archive",
        ]));
        assert_eq!(args.archive.as_deref(), Some(""));
    }

    #[test]
    fn parse_archive_with_name() {
        let args = build_args(Cli::parse_from([
            "debase-build",
            "build",
            "--target",
            "game.dll",
            "--archive=game.a",
        ]));
        assert_eq!(args.archive.as_deref(), Some("game.a"));
    }

    #[test]
    fn archive_conflicts_with_rsp() {
        let result = Cli::try_parse_from([
            "debase-build",
            "build",
            "--target",
            "game.dll",
            "--archive",
            "--rsp",
            "x.rsp",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn target_is_required() {
        assert!(Cli::try_parse_from(["debase-build", "build"]).is_err());
    }

    #[test]
    fn unknown_profile_rejected() {
        let result = Cli::try_parse_from([
            "debase-build",
            "build",
            "--target",
            "game.dll",
            "--build-type",
            "Fastest",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn profile_conversion() {
        assert_eq!(BuildProfile::from(CliProfile::Debug), BuildProfile::Debug);
        assert_eq!(
            BuildProfile::from(CliProfile::RelWithDebInfo),
            BuildProfile::RelWithDebInfo
        );
        assert_eq!(BuildProfile::from(CliProfile::Release), BuildProfile::Release);
        assert_eq!(FramePointer::from(CliFramePointer::None), FramePointer::None);
    }

    #[test]
    fn parse_wait_default_timeout() {
        let cli = Cli::parse_from(["debase-build", "wait", "--target", "/out/game.dll"]);
        match cli.command {
            Command::Wait(args) => {
                assert_eq!(args.target, "/out/game.dll");
                assert_eq!(args.timeout, 10);
            }
            _ => panic!("expected Wait command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "debase-build",
            "--quiet",
            "--color",
            "never",
            "--config",
            "/etc/debase.toml",
            "wait",
            "--target",
            "x",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.config.as_deref(), Some("/etc/debase.toml"));
    }

    #[test]
    fn parse_json_format() {
        let args = build_args(Cli::parse_from([
            "debase-build",
            "build",
            "--target",
            "game.dll",
            "--format",
            "json",
        ]));
        assert_eq!(args.format, ReportFormat::Json);
    }
}
