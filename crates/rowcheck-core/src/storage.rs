// SPDX-License-Identifier: Apache-2.0

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{Error, IoResultExt, Result};
use crate::names::CsvFileName;
use crate::report::REPORT_FILE_NAME;

pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_REPORT_DIR: &str = "reports";
pub const KEYED_REPORT_SUBDIR: &str = "by-file";

/// The two directories the service owns: uploaded inputs and generated reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    input_dir: PathBuf,
    report_dir: PathBuf,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOAD_DIR, DEFAULT_REPORT_DIR)
    }
}

impl StorageLayout {
    pub fn new(input_dir: impl Into<PathBuf>, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            report_dir: report_dir.into(),
        }
    }

    #[must_use]
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    #[must_use]
    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// Creates both directories if absent. A non-directory already occupying
    /// either path is an error; nothing is removed to make room.
    pub fn ensure(&self) -> Result<()> {
        ensure_dir(&self.input_dir)?;
        ensure_dir(&self.report_dir)?;
        ensure_dir(&self.report_dir.join(KEYED_REPORT_SUBDIR))
    }

    #[must_use]
    pub fn input_path(&self, name: &CsvFileName) -> PathBuf {
        self.input_dir.join(name.as_str())
    }

    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.report_dir.join(REPORT_FILE_NAME)
    }

    #[must_use]
    pub fn keyed_report_path(&self, name: &CsvFileName) -> PathBuf {
        self.report_dir.join(KEYED_REPORT_SUBDIR).join(name.as_str())
    }

    /// Stores an upload verbatim, replacing any earlier file with that name.
    pub fn save_upload(&self, name: &CsvFileName, content: &[u8]) -> Result<PathBuf> {
        let path = self.input_path(name);
        atomic_write(&path, content)
            .storage_context(|| format!("write upload {name}"))?;
        debug!(filename = %name, bytes = content.len(), "upload stored");
        Ok(path)
    }

    pub fn open_input(&self, name: &CsvFileName) -> Result<File> {
        let path = self.input_path(name);
        match File::open(&path) {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("file {name} has not been uploaded")))
            }
            Err(e) => Err(Error::storage(format!("open upload {name}"), e)),
        }
    }

    /// Replaces the global report and the report keyed by `name`.
    pub fn write_report(&self, name: &CsvFileName, bytes: &[u8]) -> Result<()> {
        atomic_write(&self.keyed_report_path(name), bytes)
            .storage_context(|| format!("write report for {name}"))?;
        atomic_write(&self.report_path(), bytes).storage_context(|| "write report".to_string())?;
        debug!(filename = %name, bytes = bytes.len(), "report written");
        Ok(())
    }

    /// Reads the latest report, or the one produced for `name` when given.
    pub fn read_report(&self, name: Option<&CsvFileName>) -> Result<Vec<u8>> {
        let path = match name {
            Some(name) => self.keyed_report_path(name),
            None => self.report_path(),
        };
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::NotFound(match name {
                Some(name) => format!("no report found for {name}"),
                None => "no report found".to_string(),
            })),
            Err(e) => Err(Error::storage("read report", e)),
        }
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(Error::storage(
                format!("prepare storage directory {}", path.display()),
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "path exists and is not a directory",
                ),
            ))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(Error::storage(
                format!("inspect storage directory {}", path.display()),
                e,
            ))
        }
    }
    fs::create_dir_all(path)
        .storage_context(|| format!("create storage directory {}", path.display()))
}

fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use tempfile::tempdir;

    fn layout(root: &Path) -> StorageLayout {
        StorageLayout::new(root.join("uploads"), root.join("reports"))
    }

    fn name(s: &str) -> CsvFileName {
        CsvFileName::parse(s).expect("valid name")
    }

    #[test]
    fn ensure_is_idempotent() {
        let tmp = tempdir().expect("tempdir");
        let layout = layout(tmp.path());
        layout.ensure().expect("first ensure");
        layout.ensure().expect("second ensure");
        assert!(layout.input_dir().is_dir());
        assert!(layout.report_dir().join(KEYED_REPORT_SUBDIR).is_dir());
    }

    #[test]
    fn ensure_creates_nested_directories() {
        let tmp = tempdir().expect("tempdir");
        let layout = StorageLayout::new(tmp.path().join("a/b/in"), tmp.path().join("c/d/out"));
        layout.ensure().expect("ensure");
        assert!(tmp.path().join("a/b/in").is_dir());
        assert!(tmp.path().join("c/d/out").is_dir());
    }

    #[test]
    fn ensure_refuses_a_file_in_place_of_a_directory() {
        let tmp = tempdir().expect("tempdir");
        let layout = layout(tmp.path());
        fs::write(tmp.path().join("uploads"), b"not a dir").expect("seed file");
        let err = layout.ensure().expect_err("conflict");
        assert_eq!(err.code(), ErrorCode::StorageFailure);
        assert!(err.to_string().contains("not a directory"));
        assert_eq!(
            fs::read(tmp.path().join("uploads")).expect("file kept"),
            b"not a dir"
        );
    }

    #[test]
    fn uploads_overwrite_by_name() {
        let tmp = tempdir().expect("tempdir");
        let layout = layout(tmp.path());
        layout.ensure().expect("ensure");
        let n = name("x.csv");
        layout.save_upload(&n, b"a\n1\n").expect("first");
        layout.save_upload(&n, b"b\n2\n").expect("second");
        assert_eq!(fs::read(layout.input_path(&n)).expect("read"), b"b\n2\n");
    }

    #[test]
    fn open_input_reports_absent_files_as_not_found() {
        let tmp = tempdir().expect("tempdir");
        let layout = layout(tmp.path());
        layout.ensure().expect("ensure");
        let err = layout.open_input(&name("missing.csv")).expect_err("absent");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn report_is_global_and_keyed() {
        let tmp = tempdir().expect("tempdir");
        let layout = layout(tmp.path());
        layout.ensure().expect("ensure");
        assert_eq!(
            layout.read_report(None).expect_err("none yet").code(),
            ErrorCode::NotFound
        );
        layout
            .write_report(&name("a.csv"), b"row,error\n")
            .expect("write a");
        layout
            .write_report(&name("b.csv"), b"row,error\n1,Missing value\n")
            .expect("write b");
        assert_eq!(
            layout.read_report(None).expect("latest"),
            b"row,error\n1,Missing value\n"
        );
        assert_eq!(
            layout.read_report(Some(&name("a.csv"))).expect("keyed"),
            b"row,error\n"
        );
        assert_eq!(
            layout
                .read_report(Some(&name("c.csv")))
                .expect_err("never validated")
                .code(),
            ErrorCode::NotFound
        );
    }

    #[test]
    fn missing_report_directory_reads_as_not_found() {
        let tmp = tempdir().expect("tempdir");
        let layout = layout(tmp.path());
        let err = layout.read_report(None).expect_err("no dir");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
