//! Log filename validation.
//!
//! [`LogAnalyzer`] accepts names ending in `.slf` (ASCII case-insensitive)
//! and remembers whether its last check passed.
//!
//! # Example
//!
//! ```rust
//! use task_facility::validator::LogAnalyzer;
//!
//! let mut analyzer = LogAnalyzer::new();
//!
//! assert_eq!(analyzer.is_valid_log_file_name(Some("server.SLF")), Ok(true));
//! assert!(analyzer.was_last_file_name_valid());
//!
//! assert!(analyzer.is_valid_log_file_name(Some("")).is_err());
//! assert!(!analyzer.was_last_file_name_valid());
//! ```

use crate::error::{Error, Result};

/// Extension a valid log file must carry.
pub const LOG_FILE_EXTENSION: &str = ".slf";

/// Validates log filenames and records the last outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogAnalyzer {
    was_last_file_name_valid: bool,
}

impl LogAnalyzer {
    /// Creates an analyzer; no check has passed yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the most recent check accepted its name.
    #[must_use]
    pub fn was_last_file_name_valid(&self) -> bool {
        self.was_last_file_name_valid
    }

    /// Checks that `file_name` ends with [`LOG_FILE_EXTENSION`].
    ///
    /// The recorded state is cleared before anything else, so a failed call
    /// leaves it `false`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] when the name is absent or empty.
    pub fn is_valid_log_file_name(&mut self, file_name: Option<&str>) -> Result<bool> {
        self.was_last_file_name_valid = false;

        let file_name = match file_name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(Error::invalid_argument("filename has to be provided")),
        };

        if !has_extension(file_name, LOG_FILE_EXTENSION) {
            return Ok(false);
        }

        self.was_last_file_name_valid = true;
        Ok(true)
    }
}

/// ASCII case-insensitive suffix test, compared byte-wise.
fn has_extension(file_name: &str, extension: &str) -> bool {
    let name = file_name.as_bytes();
    let ext = extension.as_bytes();
    name.len() >= ext.len() && name[name.len() - ext.len()..].eq_ignore_ascii_case(ext)
}
