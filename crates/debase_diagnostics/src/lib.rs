//! Diagnostic creation, severity management, and terminal rendering.
//!
//! Library stages never print. They emit structured [`Diagnostic`] messages
//! into a thread-safe [`DiagnosticSink`], and the command-line front end
//! renders them with a [`DiagnosticRenderer`].

#![warn(missing_docs)]

pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
