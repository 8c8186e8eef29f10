//! Exit codes.

use serde::Serialize;

/// Process exit codes for gq.
///
/// - 0: Success
/// - 1: General error (unexpected failure, malformed flag value)
/// - 2: No track-log source given
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Completed normally.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Missing source: Neither `--path` nor `--filepath` was given.
    MissingSource = 2,
    /// Interrupted: Stopped by Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "GQ000",
            Self::GeneralError => "GQ001",
            Self::MissingSource => "GQ002",
            Self::Interrupted => "GQ130",
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        // All variants fit in a u8.
        Self::from(code as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::MissingSource.as_i32(), 2);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_exit_code_prefixes() {
        assert_eq!(ExitCode::Success.code_prefix(), "GQ000");
        assert_eq!(ExitCode::MissingSource.code_prefix(), "GQ002");
        assert_eq!(ExitCode::Interrupted.code_prefix(), "GQ130");
    }

    #[test]
    fn test_exit_code_serializes_as_name() {
        let json = serde_json::to_string(&ExitCode::Interrupted).unwrap();
        assert_eq!(json, "\"Interrupted\"");
    }
}
