//! How bad a diagnostic is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity, ordered `Note < Warning < Error`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Context such as a skipped stage.
    Note,
    /// Unexpected, but the build can still succeed.
    Warning,
    /// The build cannot succeed.
    Error,
}

impl Severity {
    /// Returns `true` for [`Severity::Error`].
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }

    /// The lowercase label printed in front of a message.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// SGR color parameter used when rendering the label: red, yellow or cyan.
    pub(crate) fn ansi_color(self) -> u8 {
        match self {
            Severity::Error => 31,
            Severity::Warning => 33,
            Severity::Note => 36,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_rank_highest() {
        let mut all = vec![Severity::Error, Severity::Note, Severity::Warning];
        all.sort();
        assert_eq!(all, [Severity::Note, Severity::Warning, Severity::Error]);
        assert_eq!(all.iter().filter(|s| s.is_error()).count(), 1);
    }

    #[test]
    fn labels_match_serde_names() {
        for severity in [Severity::Note, Severity::Warning, Severity::Error] {
            let json = serde_json::to_string(&severity).unwrap();
            assert_eq!(json, format!("\"{}\"", severity.label()));
            assert_eq!(severity.to_string(), severity.label());
        }
    }
}
