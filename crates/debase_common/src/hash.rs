//! XXH3-128 digests used to fingerprint build inputs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

/// A 128-bit XXH3 digest.
///
/// Only ever compared for equality; it never names stored content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Parses the 32-digit hex form written by `Display`.
    pub fn from_hex(s: &str) -> Result<Self, ParseHashError> {
        s.parse()
    }
}

/// Lowercase hex, 32 digits.
impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_string();
        write!(f, "ContentHash({}..)", &hex[..8])
    }
}

/// A sidecar or argument that is not a 32-digit hex digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid content hash: '{input}'")]
pub struct ParseHashError {
    /// The rejected text.
    pub input: String,
}

impl FromStr for ContentHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseHashError {
            input: s.to_string(),
        };
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| err())?;
        }
        Ok(Self(bytes))
    }
}

/// Incremental XXH3-128 hasher over a sequence of tagged byte sections.
///
/// Each section is framed by its length so that moving bytes from one
/// section to its neighbour always changes the digest.
pub struct ContentHasher {
    state: Xxh3,
}

impl ContentHasher {
    /// Creates a hasher seeded with a domain tag.
    pub fn new(domain: &str) -> Self {
        let mut hasher = Self { state: Xxh3::new() };
        hasher.section(domain.as_bytes());
        hasher
    }

    /// Feeds one length-framed section into the hash.
    pub fn section(&mut self, bytes: &[u8]) {
        self.state.update(&(bytes.len() as u64).to_le_bytes());
        self.state.update(bytes);
    }

    /// Consumes the hasher and returns the final digest.
    pub fn finish(self) -> ContentHash {
        ContentHash(self.state.digest128().to_le_bytes())
    }
}
