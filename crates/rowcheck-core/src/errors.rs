// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Machine-distinguishable failure classes surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    ParseError,
    StorageFailure,
    PayloadTooLarge,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
            Self::ParseError => "parse_error",
            Self::StorageFailure => "storage_failure",
            Self::PayloadTooLarge => "payload_too_large",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("content is not valid delimited data: {0}")]
    Parse(String),

    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("payload exceeds limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

impl Error {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Parse(_) => ErrorCode::ParseError,
            Self::Storage { .. } => ErrorCode::StorageFailure,
            Self::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
        }
    }

    pub fn storage(context: impl Into<String>, source: io::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        if !value.is_io_error() {
            return Self::Parse(value.to_string());
        }
        match value.into_kind() {
            csv::ErrorKind::Io(err) => Self::storage("read csv input", err),
            other => Self::Parse(format!("{other:?}")),
        }
    }
}

/// Attaches a storage context to raw I/O results.
pub trait IoResultExt<T> {
    fn storage_context(self, context: impl FnOnce() -> String) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, io::Error> {
    fn storage_context(self, context: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|source| Error::storage(context(), source))
    }
}
