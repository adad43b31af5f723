//! # Pipeline Workers
//!
//! Thread spawning for the three pipeline stages: the directory walker that
//! feeds read jobs, the reader pool, and the stats aggregator.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::reader::FileReader;
use crate::stats::Stats;

/// One regular file waiting to be read.
#[derive(Debug, Clone)]
pub struct ReadJob {
    pub path: PathBuf,
}

/// What the walker saw, returned through its join handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    pub files_queued: u64,
    pub dirs: u64,
    pub errors: u64,
}

/// Per-worker rate limit for progress lines.
#[derive(Debug)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Instant,
}

impl ProgressThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    /// True once more than `interval` has passed since the last `true`.
    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    fn ready_at(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) > self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Spawn the directory walker.
///
/// The walker owns `task_tx`; the job queue closes when this thread exits.
pub fn spawn_walker_thread(
    root: PathBuf,
    task_tx: Sender<ReadJob>,
    stats_tx: Sender<Stats>,
) -> thread::JoinHandle<WalkOutcome> {
    thread::spawn(move || walk_tree(&root, task_tx, stats_tx))
}

/// Walk `root` depth-first, queueing every regular file and counting
/// directories. Entry errors are logged and skipped. Exactly one
/// directory-count stat is sent at the end, and `task_tx` is dropped after it.
///
/// A directory whose listing fails is not counted. `walkdir` yields such a
/// directory as `Ok` first and reports the `read_dir` failure right after,
/// so the count for it is taken back when that error arrives.
pub fn walk_tree(root: &Path, task_tx: Sender<ReadJob>, stats_tx: Sender<Stats>) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    let mut last_dir: Option<(PathBuf, usize)> = None;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .follow_root_links(false)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                outcome.errors += 1;
                if let Some((dir, depth)) = last_dir.take() {
                    let same_dir = err.path() == Some(dir.as_path()) && err.depth() == depth;
                    if same_dir && err.io_error().is_some() {
                        outcome.dirs -= 1;
                    }
                }
                let path = err.path().unwrap_or(root);
                warn!("error walking {}: {err}", path.display());
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            outcome.dirs += 1;
            last_dir = Some((entry.path().to_path_buf(), entry.depth()));
            continue;
        }
        last_dir = None;

        if file_type.is_file() {
            let job = ReadJob {
                path: entry.into_path(),
            };
            if let Err(err) = task_tx.send(job) {
                warn!(
                    "job channel closed while sending {}; stopping walk",
                    err.0.path.display()
                );
                break;
            }
            outcome.files_queued += 1;
        }
    }

    if let Err(err) = stats_tx.send(Stats::dirs(outcome.dirs)) {
        warn!("stats channel closed while sending directory count: {err}");
    }
    drop(task_tx);

    debug!(
        "walk finished root={} files_queued={} dirs={} errors={}",
        root.display(),
        outcome.files_queued,
        outcome.dirs,
        outcome.errors
    );
    outcome
}

/// Spawn the fixed pool of reader threads.
///
/// Each worker drains `rx` until the walker closes it and sends one stat per
/// fully read file. Failed files are logged and contribute nothing.
pub fn spawn_reader_workers(
    workers: usize,
    reader: Arc<dyn FileReader>,
    rx: Receiver<ReadJob>,
    stats_tx: Sender<Stats>,
    reporting_interval: Duration,
    read_buffer_size: usize,
) -> Vec<thread::JoinHandle<()>> {
    let mut handles = Vec::new();
    let worker_count = workers.max(1);

    for _ in 0..worker_count {
        let reader = reader.clone();
        let rx = rx.clone();
        let stats_tx = stats_tx.clone();

        handles.push(thread::spawn(move || {
            let mut buf = vec![0u8; read_buffer_size.max(1)];
            let mut progress = ProgressThrottle::new(reporting_interval);

            for job in rx {
                if progress.ready() {
                    info!("read {}", job.path.display());
                }

                let bytes = match reader.read_file(&job.path, &mut buf) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        warn!("{err}");
                        continue;
                    }
                };

                if let Err(err) = stats_tx.send(Stats::file(bytes)) {
                    warn!("stats channel closed while sending file stat: {err}");
                    break;
                }
            }
        }));
    }

    handles
}

/// Spawn the single stats consumer. The merged total is handed back through
/// the join handle once every sender has been dropped.
pub fn spawn_aggregator_thread(rx: Receiver<Stats>) -> thread::JoinHandle<Stats> {
    thread::spawn(move || {
        let mut total = Stats::default();
        for stats in rx {
            total.merge(stats);
        }
        total
    })
}
