use std::fmt;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::ResultRow;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to create results directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create results file {path}: {source}")]
    CreateFile { path: PathBuf, source: csv::Error },

    #[error("Failed to append result row: {0}")]
    Append(#[from] csv::Error),

    #[error("Failed to flush results file: {0}")]
    Flush(#[from] std::io::Error),
}

/// Where successful rows go. Mocked in driver tests.
#[mockall::automock]
pub trait ReportSink: fmt::Debug + Send {
    fn record(&mut self, row: &ResultRow) -> Result<(), ReportError>;
    fn finish(&mut self) -> Result<(), ReportError>;
}

/// Appends `Algorithm,InputSize,Time(ns)` rows, creating the results
/// directory on construction. Construction failure is the one fatal error
/// of the whole program.
pub struct CsvReporter {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvReporter {
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }
        let mut writer =
            csv::Writer::from_path(path).map_err(|source| ReportError::CreateFile {
                path: path.to_path_buf(),
                source,
            })?;
        writer.write_record(["Algorithm", "InputSize", "Time(ns)"])?;
        writer.flush()?;
        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for CsvReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvReporter")
            .field("path", &self.path)
            .finish()
    }
}

impl ReportSink for CsvReporter {
    fn record(&mut self, row: &ResultRow) -> Result<(), ReportError> {
        self.writer.write_record(&[
            row.algorithm_name.clone(),
            row.input_size.to_string(),
            row.elapsed_ns.to_string(),
        ])?;
        // Flush per row: rows already earned survive a later crash.
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.writer.flush()?;
        Ok(())
    }
}
