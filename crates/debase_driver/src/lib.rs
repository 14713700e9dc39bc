//! The two-stage build pipeline: debase, then lower, then publish.
//!
//! [`DebaseStage`] runs the first-stage tool unless the fingerprint sidecar
//! proves nothing changed. [`LowerStage`] compiles each bytecode unit named in
//! the [`Manifest`] to an object file, tolerating a bounded number of
//! failures. [`OutputPublisher`] turns the object list into a response file
//! or an archive. Every external tool runs through a [`ProcessRunner`].

#![warn(missing_docs)]

pub mod debase;
pub mod error;
pub mod lower;
pub mod manifest;
pub mod pipeline;
pub mod process;
pub mod publish;
pub mod wait;

pub use debase::{DebaseOutcome, DebaseStage};
pub use error::DriverError;
pub use lower::{failure_ceiling, LowerOptions, LowerReport, LowerStage, UnitFailure};
pub use manifest::Manifest;
pub use pipeline::{BuildOutcome, Pipeline, Toolchain};
pub use process::{resolve_program, Invocation, ProcessOutput, ProcessRunner, SystemRunner};
pub use publish::{OutputPublisher, Published};
pub use wait::wait_for_path;
