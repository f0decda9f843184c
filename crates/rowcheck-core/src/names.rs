// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

use crate::errors::{Error, Result};

pub const CSV_SUFFIX: &str = ".csv";
pub const FILE_NAME_MAX_BYTES: usize = 255;

/// A client-supplied upload name that is safe to join onto a storage directory.
///
/// The name is treated as an opaque identifier: it must end with the literal,
/// case-sensitive `.csv` suffix, and it may not carry anything that would make
/// the joined path escape its directory (separators, a leading dot, control
/// characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsvFileName(String);

impl CsvFileName {
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(invalid("file name must not be empty"));
        }
        if input.len() > FILE_NAME_MAX_BYTES {
            return Err(invalid(&format!(
                "file name exceeds max length {FILE_NAME_MAX_BYTES} bytes"
            )));
        }
        let Some(stem) = input.strip_suffix(CSV_SUFFIX) else {
            return Err(invalid("file name must end with .csv"));
        };
        if stem.is_empty() {
            return Err(invalid("file name must have a stem before .csv"));
        }
        if input.starts_with('.') {
            return Err(invalid("file name must not start with '.'"));
        }
        if input.contains(['/', '\\']) {
            return Err(invalid("file name must not contain path separators"));
        }
        if input.chars().any(char::is_control) {
            return Err(invalid("file name must not contain control characters"));
        }
        Ok(Self(input.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for CsvFileName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CsvFileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn invalid(reason: &str) -> Error {
    Error::InvalidInput(reason.to_string())
}
