//! # Results Log
//!
//! Append-only tab-separated log with one row per benchmark run. The header
//! is written only when the file is first created.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::pipeline::TraversalReport;

pub const HEADER: [&str; 6] = [
    "workers",
    "files",
    "dirs",
    "bytes",
    "time (seconds)",
    "bandwidth (per second)",
];

#[derive(Debug, Error)]
pub enum ResultsLogError {
    #[error("error creating output file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error opening output file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error writing output file: {0}")]
    Write(#[from] csv::Error),
    #[error("error closing output file {}: {source}", path.display())]
    Close {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Serialize)]
struct ResultRow {
    workers: usize,
    files: u64,
    dirs: u64,
    bytes: u64,
    elapsed_seconds: f64,
    bytes_per_second: u64,
}

impl From<&TraversalReport> for ResultRow {
    fn from(report: &TraversalReport) -> Self {
        Self {
            workers: report.workers,
            files: report.stats.files,
            dirs: report.stats.dirs,
            bytes: report.stats.bytes,
            elapsed_seconds: report.elapsed_seconds(),
            bytes_per_second: report.bytes_per_second(),
        }
    }
}

pub struct ResultsLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl ResultsLog {
    /// Open `path` for appending, creating it with the header if it does not
    /// exist yet.
    ///
    /// Only [`ResultsLogError::Create`] means the file could not be set up
    /// at all; callers treat it as fatal.
    pub fn open(path: &Path) -> Result<Self, ResultsLogError> {
        let file = match open_append(path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("creating output file {}", path.display());
                create_with_header(path)?;
                open_append(path).map_err(|source| ResultsLogError::Open {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Err(source) => {
                return Err(ResultsLogError::Open {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            writer: tsv_writer(file),
        })
    }

    pub fn append(&mut self, report: &TraversalReport) -> Result<(), ResultsLogError> {
        self.writer.serialize(ResultRow::from(report))?;
        Ok(())
    }

    /// Flush buffered rows and close the file.
    pub fn close(self) -> Result<(), ResultsLogError> {
        let path = self.path;
        let file = self
            .writer
            .into_inner()
            .map_err(|err| ResultsLogError::Close {
                path: path.clone(),
                source: std::io::Error::new(err.error().kind(), err.error().to_string()),
            })?;
        file.sync_all()
            .map_err(|source| ResultsLogError::Close { path, source })
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().append(true).open(path)
}

fn create_with_header(path: &Path) -> Result<(), ResultsLogError> {
    let file = File::create(path).map_err(|source| ResultsLogError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_header(path, file)
}

/// Any failure while the header goes out still counts as a creation failure.
fn write_header<W: Write>(path: &Path, out: W) -> Result<(), ResultsLogError> {
    let create_err = |source| ResultsLogError::Create {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = tsv_writer(out);
    writer
        .write_record(HEADER)
        .map_err(|err| create_err(std::io::Error::from(err)))?;
    writer.flush().map_err(create_err)?;
    Ok(())
}

fn tsv_writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_writer(out)
}
