//! Shared foundational types used across the debase build driver.
//!
//! This crate provides the content hash used for build fingerprints and the
//! closed set of build profiles with their lowering flag table.

#![warn(missing_docs)]

pub mod hash;
pub mod profile;

pub use hash::{ContentHash, ContentHasher, ParseHashError};
pub use profile::{BuildProfile, FramePointer, ParseProfileError, ProfileFlags};
