// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

use crate::errors::{Error, Result};
use crate::scan::ScanOutcome;

pub const REPORT_FILE_NAME: &str = "errors.csv";
pub const MISSING_VALUE_LABEL: &str = "Missing value";
pub const REPORT_HEADER: [&str; 2] = ["row", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRecord {
    pub row: u64,
    pub error: &'static str,
}

#[must_use]
pub fn report_records(outcome: &ScanOutcome) -> Vec<ReportRecord> {
    outcome
        .missing
        .iter()
        .map(|m| ReportRecord {
            row: m.row,
            error: MISSING_VALUE_LABEL,
        })
        .collect()
}

/// Renders the report CSV. The header is always present, so a clean input
/// still yields a downloadable report.
pub fn render_report(outcome: &ScanOutcome) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(REPORT_HEADER)?;
    for record in report_records(outcome) {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::storage("flush report buffer", e.into_error()))
}
