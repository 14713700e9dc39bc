//! The manifest written by the debase tool.
//!
//! A JSON object whose `files` entry names the bytecode units, either as a
//! single string or as a list of strings. Other keys are ignored.

use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::error::DriverError;

/// Bytecode units listed by a debase run, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    files: Vec<PathBuf>,
}

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default, deserialize_with = "deserialize_files")]
    files: Option<Vec<String>>,
}

impl Manifest {
    /// Reads and validates the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let content = std::fs::read_to_string(path).map_err(|e| DriverError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &content)
    }

    /// Parses manifest text; `path` is only used in error messages.
    pub fn parse(path: &Path, content: &str) -> Result<Self, DriverError> {
        let raw: RawManifest =
            serde_json::from_str(content).map_err(|e| DriverError::ManifestInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let files = raw.files.ok_or_else(|| DriverError::ManifestMissingFiles {
            path: path.to_path_buf(),
        })?;
        Ok(Self {
            files: files.into_iter().map(PathBuf::from).collect(),
        })
    }

    /// The unit paths exactly as listed.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Unit paths with relative entries resolved against `base`.
    pub fn resolve_units(&self, base: &Path) -> Vec<PathBuf> {
        self.files.iter().map(|f| base.join(f)).collect()
    }
}

/// Deserializes `files` as a single string, a list of strings, or null.
fn deserialize_files<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct FilesVisitor;

    impl<'de> Visitor<'de> for FilesVisitor {
        type Value = Option<Vec<String>>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(vec![v.to_string()]))
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut files = Vec::new();
            while let Some(file) = seq.next_element::<String>()? {
                files.push(file);
            }
            Ok(Some(files))
        }
    }

    deserializer.deserialize_any(FilesVisitor)
}
