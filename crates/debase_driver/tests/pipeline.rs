//! End-to-end pipeline tests against scripted stand-ins for the external tools.
//!
//! The fake debase tool writes the manifest it was configured with; the fake
//! lowering tool writes an object file unless the unit is marked as failing.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use debase_common::BuildProfile;
use debase_config::{BuildRequest, RequestOptions};
use debase_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use debase_driver::{
    DriverError, Invocation, LowerOptions, Pipeline, ProcessOutput, ProcessRunner, Published,
    Toolchain,
};

struct FakeTools {
    toolchain: Toolchain,
    manifest: Mutex<String>,
    failing_units: HashSet<String>,
    debase_exit: i32,
    archive_stderr: String,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeTools {
    fn new(toolchain: Toolchain, manifest: &str) -> Self {
        Self {
            toolchain,
            manifest: Mutex::new(manifest.to_string()),
            failing_units: HashSet::new(),
            debase_exit: 0,
            archive_stderr: String::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(mut self, units: &[&str]) -> Self {
        self.failing_units = units.iter().map(|s| s.to_string()).collect();
        self
    }

    fn archive_complains(mut self, stderr: &str) -> Self {
        self.archive_stderr = stderr.to_string();
        self
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn debase(&self, invocation: &Invocation) -> ProcessOutput {
        let args = invocation.arguments();
        if args[0] == "--archive-only" || args[0].to_string_lossy().starts_with("--archive-only=") {
            return ProcessOutput {
                stderr: self.archive_stderr.clone(),
                ..ok()
            };
        }
        if self.debase_exit != 0 {
            return ProcessOutput {
                code: Some(self.debase_exit),
                stdout: String::new(),
                stderr: "debase: unresolved reference".to_string(),
            };
        }
        let lib_dir = PathBuf::from(&args[2]);
        let name = args[3]
            .to_string_lossy()
            .trim_start_matches("--output-filenames=")
            .to_string();
        let manifest = self.manifest.lock().unwrap().clone();
        std::fs::write(lib_dir.join(name), manifest).unwrap();
        ok()
    }

    fn llc(&self, invocation: &Invocation) -> ProcessOutput {
        let args = invocation.arguments();
        let unit = Path::new(&args[args.len() - 1]);
        let object = Path::new(&args[args.len() - 2]);
        let name = unit.file_name().unwrap().to_string_lossy().into_owned();
        if self.failing_units.contains(&name) {
            return ProcessOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: format!("llc: {name}: malformed block"),
            };
        }
        std::fs::write(object, b"\x7fELF").unwrap();
        ok()
    }
}

fn ok() -> ProcessOutput {
    ProcessOutput {
        code: Some(0),
        ..Default::default()
    }
}

impl ProcessRunner for FakeTools {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, DriverError> {
        self.calls.lock().unwrap().push(invocation.clone());
        if invocation.program() == self.toolchain.debase {
            Ok(self.debase(invocation))
        } else {
            Ok(self.llc(invocation))
        }
    }
}

struct Workspace {
    dir: tempfile::TempDir,
    toolchain: Toolchain,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("tools");
        std::fs::create_dir_all(&tools).unwrap();
        std::fs::write(tools.join("debase"), b"debase v1").unwrap();
        std::fs::write(tools.join("llc"), b"llc v17").unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("game.dll"), b"MZ game").unwrap();
        let toolchain = Toolchain {
            debase: tools.join("debase"),
            llc: tools.join("llc"),
        };
        Self { dir, toolchain }
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn options(&self) -> RequestOptions {
        RequestOptions {
            target: "game.dll".to_string(),
            output_dir: Some(self.out()),
            profile: BuildProfile::Debug,
            manifest_name: "debase.json".to_string(),
            files: vec![
                "/refs/a.dll".to_string(),
                "/refs/b.dll;/refs/c.dll".to_string(),
            ],
            response: Some("game.rsp".to_string()),
            ..Default::default()
        }
    }

    fn request(&self) -> BuildRequest {
        BuildRequest::new(self.options()).unwrap()
    }

    fn build(&self, tools: &FakeTools, request: &BuildRequest) -> Result<Published, DriverError> {
        self.build_reporting(tools, request).0
    }

    /// Builds and also returns everything emitted to the sink.
    fn build_reporting(
        &self,
        tools: &FakeTools,
        request: &BuildRequest,
    ) -> (Result<Published, DriverError>, Vec<Diagnostic>) {
        let sink = DiagnosticSink::new();
        let options = LowerOptions::default();
        let result = Pipeline::new(tools, &self.toolchain, &options, &sink)
            .run(request)
            .map(|outcome| outcome.published);
        (result, sink.take_all())
    }
}

const THREE_UNITS: &str = r#"{"files": ["lib/a.bc", "lib/b.bc", "lib/c.bc"]}"#;
const SIX_UNITS: &str = concat!(
    r#"{"files": ["lib/a.bc", "lib/b.bc", "lib/c.bc", "#,
    r#""lib/d.bc", "lib/e.bc", "lib/f.bc"]}"#
);

fn programs(calls: &[Invocation]) -> Vec<String> {
    calls.iter().map(|c| c.tool_name()).collect()
}

#[test]
fn three_units_produce_ordered_response_file() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), THREE_UNITS);
    let request = ws.request();
    assert_eq!(request.files().len(), 3);

    let published = ws.build(&tools, &request).unwrap();

    let rsp = ws.out().join("game.rsp");
    assert_eq!(published, Published::ResponseFile(rsp.clone()));
    assert_eq!(
        std::fs::read_to_string(rsp).unwrap(),
        "opt/a.o opt/b.o opt/c.o"
    );
    assert!(ws.out().join("opt/a.o").is_file());
    assert_eq!(programs(&tools.calls()), vec!["debase", "llc", "llc", "llc"]);
}

#[test]
fn debase_invocation_carries_policy_and_inputs() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), THREE_UNITS);
    let mut options = ws.options();
    options.passthrough = "--strip-debug".to_string();
    ws.build(&tools, &BuildRequest::new(options).unwrap()).unwrap();

    let debase = &tools.calls()[0];
    assert_eq!(debase.cwd(), ws.out());
    let args: Vec<OsString> = debase.arguments().to_vec();
    assert_eq!(args[0], ws.out().join("game.dll").into_os_string());
    assert_eq!(args[1], "-o");
    assert_eq!(args[3], "--output-filenames=debase.json");
    assert_eq!(&args[4..8], ["--emit-all", "--allow-no-builtins", "--permissive", "--strip-debug"]);
    assert_eq!(&args[8..], ["/refs/a.dll", "/refs/b.dll", "/refs/c.dll"]);
}

#[test]
fn missing_files_key_fails_before_lowering() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), r#"{"units": ["lib/a.bc"]}"#);
    let err = ws.build(&tools, &ws.request()).unwrap_err();

    assert!(matches!(err, DriverError::ManifestMissingFiles { .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("\"files\""));
    assert_eq!(programs(&tools.calls()), vec!["debase"]);
}

#[test]
fn single_string_manifest() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), r#"{"files": "lib/only.bc"}"#);
    ws.build(&tools, &ws.request()).unwrap();
    assert_eq!(
        std::fs::read_to_string(ws.out().join("game.rsp")).unwrap(),
        "opt/only.o"
    );
}

#[test]
fn identical_rerun_skips_debase() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), THREE_UNITS);
    let (first, diags) = ws.build_reporting(&tools, &ws.request());
    first.unwrap();
    assert!(diags.is_empty());
    tools.clear_calls();

    let (second, diags) = ws.build_reporting(&tools, &ws.request());
    second.unwrap();
    assert_eq!(programs(&tools.calls()), vec!["llc", "llc", "llc"]);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Note);
    assert!(diags[0].message.contains("debase skipped"));
    assert_eq!(diags[0].path, Some(ws.out().join("lib/debase.json")));
}

#[test]
fn changed_flag_reruns_debase_and_refreshes_fingerprint() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), THREE_UNITS);
    ws.build(&tools, &ws.request()).unwrap();
    let sidecar = ws.out().join("game.dll.xxh3");
    let first = std::fs::read_to_string(&sidecar).unwrap();
    tools.clear_calls();

    let mut options = ws.options();
    options.passthrough = "--no-inline".to_string();
    ws.build(&tools, &BuildRequest::new(options).unwrap()).unwrap();

    let calls = programs(&tools.calls());
    assert_eq!(calls.iter().filter(|p| *p == "debase").count(), 1);
    let second = std::fs::read_to_string(&sidecar).unwrap();
    assert_ne!(first, second);
}

#[test]
fn upgraded_tool_binary_reruns_debase() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), THREE_UNITS);
    ws.build(&tools, &ws.request()).unwrap();
    std::fs::write(&ws.toolchain.debase, b"debase v2").unwrap();
    tools.clear_calls();

    ws.build(&tools, &ws.request()).unwrap();
    assert_eq!(programs(&tools.calls())[0], "debase");
}

#[test]
fn deleted_sidecar_reruns_debase() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), THREE_UNITS);
    ws.build(&tools, &ws.request()).unwrap();
    std::fs::remove_file(ws.out().join("game.dll.xxh3")).unwrap();
    tools.clear_calls();

    ws.build(&tools, &ws.request()).unwrap();
    assert_eq!(programs(&tools.calls())[0], "debase");
}

#[test]
fn missing_target_invokes_nothing() {
    let ws = Workspace::new();
    std::fs::remove_file(ws.out().join("game.dll")).unwrap();
    let tools = FakeTools::new(ws.toolchain.clone(), THREE_UNITS);
    let err = ws.build(&tools, &ws.request()).unwrap_err();
    assert!(matches!(err, DriverError::TargetMissing { .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(tools.calls().is_empty());
}

#[test]
fn debase_failure_propagates_exit_code() {
    let ws = Workspace::new();
    let mut tools = FakeTools::new(ws.toolchain.clone(), THREE_UNITS);
    tools.debase_exit = 9;
    let err = ws.build(&tools, &ws.request()).unwrap_err();
    assert_eq!(err.exit_code(), 9);
    assert_eq!(
        err.to_diagnostic().notes,
        vec!["debase: unresolved reference"]
    );
    assert!(!ws.out().join("game.dll.xxh3").exists());
}

#[test]
fn lowering_failure_fails_build_without_publishing() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), SIX_UNITS).failing(&["c.bc"]);
    let sink = DiagnosticSink::new();
    let options = LowerOptions::default();
    let request = ws.request();
    let err = Pipeline::new(&tools, &ws.toolchain, &options, &sink)
        .run(&request)
        .unwrap_err();

    match err {
        DriverError::LoweringFailed { failed, total } => {
            assert_eq!(failed, 1);
            assert_eq!(total, 6);
        }
        other => panic!("expected LoweringFailed, got {other:?}"),
    }
    // Within the ceiling: every unit was still attempted.
    assert_eq!(programs(&tools.calls()).len(), 7);
    assert!(!ws.out().join("game.rsp").exists());
    // Objects that lowered stay on disk.
    assert!(ws.out().join("opt/a.o").is_file());
    assert!(ws.out().join("opt/f.o").is_file());
    assert_eq!(sink.error_count(), 1);
}

#[test]
fn failure_ceiling_stops_remaining_units() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), SIX_UNITS).failing(&["a.bc", "b.bc", "c.bc"]);
    let err = ws.build(&tools, &ws.request()).unwrap_err();
    assert!(matches!(err, DriverError::LoweringFailed { failed: 3, total: 6 }));
    // Ceiling for 6 units is 2; the third failure (c.bc) stops the batch.
    assert_eq!(programs(&tools.calls()), vec!["debase", "llc", "llc", "llc"]);
}

#[test]
fn archive_mode_invokes_debase_with_objects() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), THREE_UNITS);
    let mut options = ws.options();
    options.response = None;
    options.archive = Some("game.a".to_string());
    let published = ws.build(&tools, &BuildRequest::new(options).unwrap()).unwrap();

    assert!(matches!(published, Published::Archive { .. }));
    let calls = tools.calls();
    let archive = calls.last().unwrap();
    assert_eq!(archive.program(), ws.toolchain.debase);
    let args: Vec<OsString> = archive.arguments().to_vec();
    assert_eq!(args[0], "--archive-only=game.a");
    assert_eq!(args[1], "--permissive");
    assert_eq!(&args[4..], ["opt/a.o", "opt/b.o", "opt/c.o"]);
    assert!(!ws.out().join("game.rsp").exists());
}

#[test]
fn archiver_stderr_becomes_a_warning() {
    let ws = Workspace::new();
    let tools = FakeTools::new(ws.toolchain.clone(), THREE_UNITS)
        .archive_complains("debase: duplicate symbol _init kept once\n");
    let mut options = ws.options();
    options.response = None;
    options.archive = Some(String::new());
    let (result, diags) = ws.build_reporting(&tools, &BuildRequest::new(options).unwrap());

    assert!(matches!(result.unwrap(), Published::Archive { name: None, .. }));
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Warning);
    assert_eq!(diags[0].notes, vec!["debase: duplicate symbol _init kept once"]);
}

#[test]
fn parallel_lowering_matches_sequential_output() {
    let ws = Workspace::new();
    let files: Vec<String> = (0..16).map(|i| format!("\"lib/u{i:02}.bc\"")).collect();
    let manifest = format!("{{\"files\": [{}]}}", files.join(","));
    let tools = FakeTools::new(ws.toolchain.clone(), &manifest);
    let sink = DiagnosticSink::new();
    let options = LowerOptions {
        regalloc: Some("pbqp".to_string()),
        jobs: 4,
    };
    Pipeline::new(&tools, &ws.toolchain, &options, &sink)
        .run(&ws.request())
        .unwrap();

    let expected: Vec<String> = (0..16).map(|i| format!("opt/u{i:02}.o")).collect();
    assert_eq!(
        std::fs::read_to_string(ws.out().join("game.rsp")).unwrap(),
        expected.join(" ")
    );
}
