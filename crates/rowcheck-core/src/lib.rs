#![forbid(unsafe_code)]

use sha2::{Digest, Sha256};

pub mod errors;
pub mod names;
pub mod report;
pub mod scan;
pub mod storage;
pub mod validation;

pub use errors::{Error, ErrorCode, IoResultExt, Result};
pub use names::{CsvFileName, CSV_SUFFIX, FILE_NAME_MAX_BYTES};
pub use report::{
    render_report, report_records, ReportRecord, MISSING_VALUE_LABEL, REPORT_FILE_NAME,
};
pub use scan::{scan_reader, MissingRow, ScanOutcome, ScanPolicy, DEFAULT_NULL_TOKENS};
pub use storage::{StorageLayout, DEFAULT_REPORT_DIR, DEFAULT_UPLOAD_DIR};
pub use validation::{validate_upload, ValidationSummary};

pub const CRATE_NAME: &str = "rowcheck-core";

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
