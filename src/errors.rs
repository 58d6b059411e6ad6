//! Configuration-time error types with error codes and helpful messages.
//!
//! Everything here is fatal at construction time and aborts the run before
//! any search work starts. Constraint violations during the search itself
//! are *not* errors — they are ordinary `(added, full)` rejections (see
//! `line.rs` and `group.rs`).
//!
//! # Error Codes
//!
//! - C001: `LineLimitTooLarge` (requested line limit above the hard ceiling)
//! - C002: `InvalidConfig` (search configuration that can never produce a group)
//! - C003: `MalformedWord` (inventory record that cannot be split into c/v/c)
//! - C004: `RebuildMismatch` (rebuilt canonical text differs from the source record)

/// Fatal configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("line limit {requested} exceeds the supported maximum of {max}")]
    LineLimitTooLarge { requested: usize, max: usize },

    #[error("invalid search configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("word \"{word}\" cannot be split into consonant/vowel/consonant parts")]
    MalformedWord { word: String },

    #[error("rebuilt word \"{rebuilt}\" does not match source record \"{source_text}\"")]
    RebuildMismatch { source_text: String, rebuilt: String },
}

impl ConfigError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::LineLimitTooLarge { .. } => "C001",
            ConfigError::InvalidConfig { .. } => "C002",
            ConfigError::MalformedWord { .. } => "C003",
            ConfigError::RebuildMismatch { .. } => "C004",
        }
    }

    /// Returns a helpful suggestion or example for this error
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            ConfigError::LineLimitTooLarge { .. } => {
                Some("Lines hold at most 10 words; lower the per-line limit")
            }
            ConfigError::MalformedWord { .. } => {
                Some("Each word needs a vowel after the first letter and at least one trailing consonant")
            }
            ConfigError::RebuildMismatch { .. } => {
                Some("The word list and the vowel list disagree; check both input files")
            }
            ConfigError::InvalidConfig { .. } => None,
        }
    }

    /// Formats the error with code and optional help text
    #[must_use]
    pub fn display_detailed(&self) -> String {
        if let Some(help) = self.help() {
            format!("{} ({})\n{help}", self, self.code())
        } else {
            format!("{} ({})", self, self.code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_unique() {
        let errors = vec![
            ConfigError::LineLimitTooLarge { requested: 11, max: 10 },
            ConfigError::InvalidConfig { reason: "bad".to_string() },
            ConfigError::MalformedWord { word: "BCD".to_string() },
            ConfigError::RebuildMismatch {
                source_text: "AAB".to_string(),
                rebuilt: "AB".to_string(),
            },
        ];

        let mut codes = std::collections::HashSet::new();
        for err in errors {
            let code = err.code();
            assert!(code.starts_with('C'), "code '{code}' should start with 'C'");
            assert!(codes.insert(code), "duplicate error code {code}");
        }
        assert_eq!(codes.len(), 4);
    }

    #[test]
    fn test_display_detailed_includes_code_and_help() {
        let err = ConfigError::LineLimitTooLarge { requested: 11, max: 10 };
        let detailed = err.display_detailed();

        assert!(detailed.contains("C001"));
        assert!(detailed.contains("11"));
        assert!(detailed.contains("at most 10"));
    }

    #[test]
    fn test_display_detailed_without_help() {
        let err = ConfigError::InvalidConfig { reason: "zero lines requested".to_string() };
        let detailed = err.display_detailed();

        assert!(detailed.contains("C002"));
        assert!(detailed.contains("zero lines requested"));
    }
}
