//! Build profiles and the lowering flag table.
//!
//! The set of profiles is closed. Each profile maps to a fixed optimization
//! level and frame-pointer policy; the size- and speed-oriented profiles defer
//! the frame-pointer choice to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The requested build profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildProfile {
    /// No optimization, no frame pointers.
    #[default]
    Debug,
    /// Moderate optimization with non-leaf frame pointers.
    RelWithDebInfo,
    /// Size-minimizing build with a caller-chosen frame-pointer policy.
    MinSizeRel,
    /// Performance-maximizing build with a caller-chosen frame-pointer policy.
    Release,
}

impl BuildProfile {
    /// All profiles, in declaration order.
    pub const ALL: [BuildProfile; 4] = [
        BuildProfile::Debug,
        BuildProfile::RelWithDebInfo,
        BuildProfile::MinSizeRel,
        BuildProfile::Release,
    ];

    /// Returns the canonical profile name.
    pub fn as_str(self) -> &'static str {
        match self {
            BuildProfile::Debug => "Debug",
            BuildProfile::RelWithDebInfo => "RelWithDebInfo",
            BuildProfile::MinSizeRel => "MinSizeRel",
            BuildProfile::Release => "Release",
        }
    }

    /// Resolves the lowering flags for this profile.
    ///
    /// `requested` is only honored by `MinSizeRel` and `Release`.
    pub fn flags(self, requested: FramePointer) -> ProfileFlags {
        let (opt_level, frame_pointer) = match self {
            BuildProfile::Debug => (0, FramePointer::None),
            BuildProfile::RelWithDebInfo => (2, FramePointer::NonLeaf),
            BuildProfile::MinSizeRel => (2, requested),
            BuildProfile::Release => (3, requested),
        };
        ProfileFlags {
            opt_level,
            frame_pointer,
        }
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildProfile {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildProfile::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseProfileError {
                kind: "build profile",
                input: s.to_string(),
            })
    }
}

/// Frame-pointer retention policy passed to the lowering tool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FramePointer {
    /// Keep frame pointers in every function.
    #[default]
    All,
    /// Keep frame pointers only in non-leaf functions.
    NonLeaf,
    /// Omit frame pointers.
    None,
}

impl FramePointer {
    /// Returns the value used on the lowering tool command line.
    pub fn as_str(self) -> &'static str {
        match self {
            FramePointer::All => "all",
            FramePointer::NonLeaf => "non-leaf",
            FramePointer::None => "none",
        }
    }
}

impl fmt::Display for FramePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FramePointer {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(FramePointer::All),
            "non-leaf" => Ok(FramePointer::NonLeaf),
            "none" => Ok(FramePointer::None),
            _ => Err(ParseProfileError {
                kind: "frame-pointer policy",
                input: s.to_string(),
            }),
        }
    }
}

/// Error returned for an unrecognized profile or frame-pointer name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{input}'")]
pub struct ParseProfileError {
    /// What was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}

/// The resolved lowering flags for one profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProfileFlags {
    /// The `-O=` level.
    pub opt_level: u8,
    /// The `--frame-pointer=` value.
    pub frame_pointer: FramePointer,
}

impl ProfileFlags {
    /// Renders the flags as lowering tool arguments.
    pub fn to_args(self) -> Vec<String> {
        vec![
            format!("-O={}", self.opt_level),
            format!("--frame-pointer={}", self.frame_pointer),
        ]
    }
}
