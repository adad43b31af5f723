//! # Pipeline Module
//!
//! Orchestrates one benchmark traversal: a walker thread feeding a bounded
//! job queue, a fixed pool of reader threads, and a single aggregator thread
//! merging their stats.
//!
//! Shutdown runs in two phases. The walker drops the job sender when it is
//! done, the readers drain the queue and exit, and only after every reader
//! has been joined is the last stats sender dropped so the aggregator can
//! finish.

pub mod workers;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{debug, warn};

use crate::config::Config;
use crate::reader::{FileReader, FsReader};
use crate::stats::Stats;

use workers::{ReadJob, WalkOutcome};

/// Final totals of one traversal and how long it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraversalReport {
    pub stats: Stats,
    pub workers: usize,
    pub elapsed: Duration,
}

impl TraversalReport {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Read bandwidth rounded down to whole bytes per second.
    pub fn bytes_per_second(&self) -> u64 {
        let secs = self.elapsed_seconds();
        if secs > 0.0 {
            (self.stats.bytes as f64 / secs) as u64
        } else {
            0
        }
    }
}

/// Traverse `root` with the plain filesystem reader.
///
/// # Example
/// ```rust
/// use readbench::{config, pipeline};
///
/// let dir = std::env::temp_dir().join("readbench_doc_example");
/// std::fs::create_dir_all(&dir).unwrap();
/// std::fs::write(dir.join("a.txt"), b"hello").unwrap();
///
/// let cfg = config::load_config(None).unwrap();
/// let report = pipeline::run_traversal(&cfg, &dir);
/// assert!(report.stats.files >= 1);
/// ```
pub fn run_traversal(cfg: &Config, root: &Path) -> TraversalReport {
    run_traversal_with_reader(cfg, root, Arc::new(FsReader))
}

/// Traverse `root`, reading each file through `reader`.
///
/// Never fails: walk and read errors are logged by the stage that hit them.
pub fn run_traversal_with_reader(
    cfg: &Config,
    root: &Path,
    reader: Arc<dyn FileReader>,
) -> TraversalReport {
    TraversalRunner::new(cfg, root, reader).run()
}

struct TraversalChannels {
    task_tx: Sender<ReadJob>,
    task_rx: Receiver<ReadJob>,
    stats_tx: Sender<Stats>,
    stats_rx: Receiver<Stats>,
}

struct WorkerHandles {
    aggregator: thread::JoinHandle<Stats>,
    readers: Vec<thread::JoinHandle<()>>,
}

struct TraversalRunner<'a> {
    cfg: &'a Config,
    root: PathBuf,
    reader: Arc<dyn FileReader>,
}

impl<'a> TraversalRunner<'a> {
    fn new(cfg: &'a Config, root: &Path, reader: Arc<dyn FileReader>) -> Self {
        Self {
            cfg,
            root: root.to_path_buf(),
            reader,
        }
    }

    fn worker_count(&self) -> usize {
        self.cfg.workers.max(1)
    }

    fn run(self) -> TraversalReport {
        let start = Instant::now();

        let channels = self.setup_channels();
        let handles = self.spawn_workers(&channels);

        let TraversalChannels {
            task_tx,
            task_rx,
            stats_tx,
            stats_rx,
        } = channels;
        // Readers and the aggregator hold their own clones.
        drop(task_rx);
        drop(stats_rx);

        let walker = workers::spawn_walker_thread(self.root.clone(), task_tx, stats_tx.clone());

        let stats = self.finalize(walker, handles, stats_tx);
        let elapsed = start.elapsed();

        debug!(
            "traversal_summary root={} workers={} files={} dirs={} bytes={} elapsed_seconds={:.3}",
            self.root.display(),
            self.worker_count(),
            stats.files,
            stats.dirs,
            stats.bytes,
            elapsed.as_secs_f64()
        );

        TraversalReport {
            stats,
            workers: self.worker_count(),
            elapsed,
        }
    }

    fn setup_channels(&self) -> TraversalChannels {
        let (task_tx, task_rx) = bounded::<ReadJob>(self.cfg.task_queue_capacity.max(1));
        let (stats_tx, stats_rx) = bounded::<Stats>(self.cfg.stats_queue_capacity.max(1));
        TraversalChannels {
            task_tx,
            task_rx,
            stats_tx,
            stats_rx,
        }
    }

    fn spawn_workers(&self, channels: &TraversalChannels) -> WorkerHandles {
        let aggregator = workers::spawn_aggregator_thread(channels.stats_rx.clone());

        let readers = workers::spawn_reader_workers(
            self.worker_count(),
            self.reader.clone(),
            channels.task_rx.clone(),
            channels.stats_tx.clone(),
            self.cfg.reporting_interval,
            self.cfg.read_buffer_size,
        );

        WorkerHandles {
            aggregator,
            readers,
        }
    }

    fn finalize(
        &self,
        walker: thread::JoinHandle<WalkOutcome>,
        handles: WorkerHandles,
        stats_tx: Sender<Stats>,
    ) -> Stats {
        match walker.join() {
            Ok(outcome) => {
                if outcome.errors > 0 {
                    warn!(
                        "walk of {} hit {} error(s); affected entries were skipped",
                        self.root.display(),
                        outcome.errors
                    );
                }
            }
            Err(_) => warn!("walker thread panicked"),
        }

        for handle in handles.readers {
            if handle.join().is_err() {
                warn!("reader thread panicked");
            }
        }

        // Every reader has stopped sending; closing the stats queue now
        // cannot lose a stat.
        drop(stats_tx);
        debug!("all readers joined; waiting for aggregator");

        match handles.aggregator.join() {
            Ok(stats) => stats,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(bytes: u64, elapsed: Duration) -> TraversalReport {
        TraversalReport {
            stats: Stats {
                files: 1,
                dirs: 1,
                bytes,
            },
            workers: 2,
            elapsed,
        }
    }

    #[test]
    fn bandwidth_is_floored() {
        assert_eq!(report(10, Duration::from_secs(3)).bytes_per_second(), 3);
        assert_eq!(report(60, Duration::from_millis(500)).bytes_per_second(), 120);
    }

    #[test]
    fn bandwidth_with_zero_elapsed_is_zero() {
        assert_eq!(report(10, Duration::ZERO).bytes_per_second(), 0);
    }
}
