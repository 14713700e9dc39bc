//! Driver configuration and the validated build request.
//!
//! Reads the optional `debase.toml` file into a strongly-typed [`DriverConfig`]
//! and normalizes command-line input into an immutable [`BuildRequest`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod request;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use request::{BuildRequest, PublishMode, RequestOptions};
pub use types::*;
