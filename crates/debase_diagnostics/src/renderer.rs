//! Plain-text rendering of diagnostics for a terminal.

use std::fmt::Write;

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Turns a diagnostic into printable text.
pub trait DiagnosticRenderer {
    /// Renders `diag`, newline-terminated.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// rustc-style layout:
///
/// ```text
/// error: failed to run llc on lib/a.bc!
///   --> lib/a.bc
///    = note: llc: error: invalid bitcode signature
/// ```
///
/// Multi-line notes, typically captured tool stderr, are indented under the
/// first line.
pub struct TerminalRenderer {
    /// Wrap the severity label in ANSI color codes.
    pub color: bool,
}

const NOTE_INDENT: &str = "           ";

impl TerminalRenderer {
    /// Creates a renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn label(&self, severity: Severity) -> String {
        if self.color {
            format!("\x1b[1;{}m{}\x1b[0m", severity.ansi_color(), severity.label())
        } else {
            severity.label().to_string()
        }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}: {}", self.label(diag.severity), diag.message);
        if let Some(path) = &diag.path {
            let _ = writeln!(out, "  --> {}", path.display());
        }
        for note in &diag.notes {
            for (i, line) in note.trim_end().lines().enumerate() {
                if i == 0 {
                    let _ = writeln!(out, "   = note: {line}");
                } else {
                    let _ = writeln!(out, "{NOTE_INDENT}{line}");
                }
            }
        }
        for help in &diag.help {
            let _ = writeln!(out, "   = help: {help}");
        }
        out
    }
}
