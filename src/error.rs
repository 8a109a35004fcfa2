//! Error types for tosheets.
//!
//! Internally everything is an `anyhow::Error` (see `Res`). At the boundaries of the public
//! operations the error is tagged with an `ErrorType` so that callers, and tests, can tell a
//! configuration problem from a failed remote call.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The category of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Something required is missing or malformed in flags, environment or credentials.
    Config,
    /// The input file could not be opened or read.
    FileAccess,
    /// The spreadsheet service (or its authentication) returned an error.
    Remote,
    /// An export found no data rows.
    EmptyResult,
    /// Anything not otherwise categorized.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// The public error type: an `anyhow::Error` with an `ErrorType`.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    /// Creates an `ErrorType::Config` error from a message.
    pub(crate) fn config(message: impl Display) -> Self {
        Self::new(ErrorType::Config, anyhow::anyhow!("{message}"))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// Every error category exits with 1.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The alternate form prints the whole context chain on one line.
        write!(f, "{:#}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for Error {
    fn from(inner: anyhow::Error) -> Self {
        Self::new(ErrorType::Internal, inner)
    }
}

/// Converts an internal `Res` into a public `Result` with the given `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_tags_error_type() {
        let res: Res<()> = Err(anyhow::anyhow!("boom")).context("while testing");
        let err = res.pub_result(ErrorType::Remote).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Remote);
        assert_eq!(err.to_string(), "while testing: boom");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_untagged_error_is_internal() {
        let err: Error = anyhow::anyhow!("unexpected").into();
        assert_eq!(err.error_type(), ErrorType::Internal);
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::EmptyResult.to_string(), "empty_result");
        assert_eq!(ErrorType::FileAccess.to_string(), "file_access");
    }
}
