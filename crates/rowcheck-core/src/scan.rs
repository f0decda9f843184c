// SPDX-License-Identifier: Apache-2.0

//! Missing-value scan over delimited input.
//!
//! The first non-blank record is the header and fixes the schema width. Data
//! rows are numbered from 1 in file order, header excluded, blank lines
//! skipped. A row shorter than the header is padded: each absent cell counts
//! as missing. A row longer than the header cannot be mapped onto the schema
//! and fails the whole scan.

use std::io::Read;

use serde::Serialize;

use crate::errors::{Error, Result};

/// Cell texts treated as null in addition to the empty string.
pub const DEFAULT_NULL_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanPolicy {
    pub delimiter: u8,
    pub null_tokens: Vec<String>,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ScanPolicy {
    #[must_use]
    pub fn with_null_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn is_missing(&self, cell: Option<&str>) -> bool {
        match cell {
            None => true,
            Some(text) => text.is_empty() || self.null_tokens.iter().any(|t| t == text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingRow {
    pub row: u64,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub columns: Vec<String>,
    pub rows_scanned: u64,
    pub missing: Vec<MissingRow>,
}

impl ScanOutcome {
    #[must_use]
    pub fn total_errors(&self) -> usize {
        self.missing.len()
    }
}

pub fn scan_reader<R: Read>(reader: R, policy: &ScanPolicy) -> Result<ScanOutcome> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(policy.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = csv_reader.headers()?.iter().map(ToString::to_string).collect();
    if columns.is_empty() {
        return Err(Error::Parse("no header row found".to_string()));
    }
    let width = columns.len();

    let mut rows_scanned = 0_u64;
    let mut missing = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows_scanned += 1;
        if record.len() > width {
            let line = record.position().map_or(0, csv::Position::line);
            return Err(Error::Parse(format!(
                "line {line}: expected {width} fields, saw {}",
                record.len()
            )));
        }
        let offending: Vec<String> = (0..width)
            .filter(|&i| policy.is_missing(record.get(i)))
            .map(|i| columns[i].clone())
            .collect();
        if !offending.is_empty() {
            missing.push(MissingRow {
                row: rows_scanned,
                columns: offending,
            });
        }
    }

    Ok(ScanOutcome {
        columns,
        rows_scanned,
        missing,
    })
}
