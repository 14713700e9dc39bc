//! Build fingerprinting for the debase stage.
//!
//! This crate decides whether the expensive first-stage tool can be skipped.
//! A [`Fingerprint`] digests the tool binary, the target module, the previous
//! manifest, and the build-affecting configuration; a [`FingerprintStore`]
//! persists it next to the target and compares it on the next run.

#![warn(missing_docs)]

pub mod error;
pub mod fingerprint;
pub mod store;

pub use error::CacheError;
pub use fingerprint::{Fingerprint, FingerprintInputs};
pub use store::{FingerprintStore, FINGERPRINT_EXT};
