// SPDX-License-Identifier: Apache-2.0

use std::io::BufReader;

use serde::Serialize;
use tracing::info;

use crate::errors::Result;
use crate::names::CsvFileName;
use crate::report::render_report;
use crate::scan::{scan_reader, ScanPolicy};
use crate::storage::StorageLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total_errors: usize,
    pub rows_scanned: u64,
}

/// Scans a stored upload and replaces the report with its missing rows.
///
/// The report is only touched once the scan succeeds, so a parse failure
/// leaves the previous report in place.
pub fn validate_upload(
    layout: &StorageLayout,
    name: &CsvFileName,
    policy: &ScanPolicy,
) -> Result<ValidationSummary> {
    let file = layout.open_input(name)?;
    let outcome = scan_reader(BufReader::new(file), policy)?;
    let report = render_report(&outcome)?;
    layout.write_report(name, &report)?;
    info!(
        filename = %name,
        rows_scanned = outcome.rows_scanned,
        total_errors = outcome.total_errors(),
        "validation complete"
    );
    Ok(ValidationSummary {
        total_errors: outcome.total_errors(),
        rows_scanned: outcome.rows_scanned,
    })
}
