//! Shared fixtures for traversal tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use readbench::config::{self, Config};
use readbench::reader::{FileReader, FsReader, ReadError};

pub fn write_file(root: &Path, rel: &str, size: usize) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(&path, vec![b'x'; size]).expect("write file");
    path
}

pub fn config_with_workers(workers: usize) -> Config {
    let mut cfg = config::load_config(None).expect("config");
    cfg.workers = workers;
    cfg
}

/// Which step of a read should fail for a matching file name.
#[derive(Debug, Clone, Copy)]
pub enum FailAt {
    Open,
    Read,
    Close,
}

/// Filesystem reader that fails on chosen file names and records every path
/// it was asked to read.
pub struct FaultyReader {
    fail_name: String,
    fail_at: FailAt,
    pub seen: Mutex<Vec<PathBuf>>,
}

impl FaultyReader {
    pub fn new(fail_name: &str, fail_at: FailAt) -> Self {
        Self {
            fail_name: fail_name.to_string(),
            fail_at,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        let mut seen = self.seen.lock().unwrap().clone();
        seen.sort();
        seen
    }
}

impl FileReader for FaultyReader {
    fn read_file(&self, path: &Path, buf: &mut [u8]) -> Result<u64, ReadError> {
        self.seen.lock().unwrap().push(path.to_path_buf());

        let matches = path
            .file_name()
            .map(|name| name == self.fail_name.as_str())
            .unwrap_or(false);
        if !matches {
            return FsReader.read_file(path, buf);
        }

        let source = std::io::Error::other("injected failure");
        let path = path.to_path_buf();
        Err(match self.fail_at {
            FailAt::Open => ReadError::Open { path, source },
            FailAt::Read => ReadError::Read { path, source },
            FailAt::Close => ReadError::Close { path, source },
        })
    }
}
