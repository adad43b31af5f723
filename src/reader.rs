use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("unable to read {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error closing {}: {source}", path.display())]
    Close {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reads one file to completion and reports how many bytes it held.
///
/// `buf` is scratch space owned by the calling worker; content is discarded.
pub trait FileReader: Send + Sync {
    fn read_file(&self, path: &Path, buf: &mut [u8]) -> Result<u64, ReadError>;
}

/// Plain filesystem reader: open, read to EOF, close.
pub struct FsReader;

impl FileReader for FsReader {
    fn read_file(&self, path: &Path, buf: &mut [u8]) -> Result<u64, ReadError> {
        let mut file = File::open(path).map_err(|source| ReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let total = match drain(&mut file, buf) {
            Ok(total) => total,
            Err(source) => {
                let _ = close_file(file);
                return Err(ReadError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        close_file(file).map_err(|source| ReadError::Close {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(total)
    }
}

fn drain(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<u64> {
    let mut total = 0u64;
    loop {
        match reader.read(buf) {
            Ok(0) => return Ok(total),
            Ok(n) => total += n as u64,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Close the descriptor explicitly so the error is not swallowed by `Drop`.
#[cfg(unix)]
fn close_file(file: File) -> std::io::Result<()> {
    use std::os::unix::io::IntoRawFd;

    let fd = file.into_raw_fd();
    // SAFETY: `fd` came from `into_raw_fd`, so it is open and owned by us.
    let rc = unsafe { libc::close(fd) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn close_file(file: File) -> std::io::Result<()> {
    drop(file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn reads_whole_file_with_small_buffer() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("data.bin");
        std::fs::write(&path, vec![7u8; 10_000]).expect("write");

        let mut buf = vec![0u8; 512];
        let n = FsReader.read_file(&path, &mut buf).expect("read");
        assert_eq!(n, 10_000);
    }

    #[test]
    fn empty_file_reads_zero_bytes() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").expect("write");

        let mut buf = vec![0u8; 64];
        assert_eq!(FsReader.read_file(&path, &mut buf).expect("read"), 0);
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nope");

        let mut buf = vec![0u8; 64];
        let err = FsReader.read_file(&path, &mut buf).unwrap_err();
        assert!(matches!(err, ReadError::Open { .. }));
        assert!(err.to_string().starts_with("unable to read"));
    }

    #[test]
    fn directory_is_read_error() {
        let dir = tempdir().expect("tempdir");

        let mut buf = vec![0u8; 64];
        let err = FsReader.read_file(dir.path(), &mut buf).unwrap_err();
        // Opening a directory succeeds on Linux; reading it fails.
        assert!(matches!(err, ReadError::Read { .. } | ReadError::Open { .. }));
    }

    struct Flaky {
        chunks: Vec<std::io::Result<usize>>,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let next = self.chunks.remove(0);
            next.map(|n| n.min(buf.len()))
        }
    }

    #[test]
    fn drain_retries_interrupted_reads() {
        let mut reader = Flaky {
            chunks: vec![
                Ok(4),
                Err(std::io::Error::from(ErrorKind::Interrupted)),
                Ok(3),
            ],
        };
        let mut buf = [0u8; 8];
        assert_eq!(drain(&mut reader, &mut buf).expect("drain"), 7);
    }

    #[test]
    fn drain_stops_on_hard_error() {
        let mut reader = Flaky {
            chunks: vec![Ok(4), Err(std::io::Error::other("boom"))],
        };
        let mut buf = [0u8; 8];
        assert!(drain(&mut reader, &mut buf).is_err());
    }

    #[test]
    fn drain_counts_cursor_bytes() {
        let mut cursor = Cursor::new(vec![1u8; 100]);
        let mut buf = [0u8; 7];
        assert_eq!(drain(&mut cursor, &mut buf).expect("drain"), 100);
    }
}
