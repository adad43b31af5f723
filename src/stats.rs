//! # Stats
//!
//! Counters emitted by the walker and the reader workers. Totals are
//! combined by field-wise addition, so merge order never matters.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::Serialize;

/// Files, directories and bytes seen by one emission or by a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub files: u64,
    pub dirs: u64,
    pub bytes: u64,
}

impl Stats {
    /// Stat for one fully read file.
    pub fn file(bytes: u64) -> Self {
        Self {
            files: 1,
            dirs: 0,
            bytes,
        }
    }

    /// Summary stat sent by the walker once traversal is done.
    pub fn dirs(dirs: u64) -> Self {
        Self {
            files: 0,
            dirs,
            bytes: 0,
        }
    }

    /// Add all counters from `other`.
    pub fn merge(&mut self, other: Stats) {
        self.files += other.files;
        self.dirs += other.dirs;
        self.bytes += other.bytes;
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, rhs: Stats) -> Stats {
        self.merge(rhs);
        self
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Stats) {
        self.merge(rhs);
    }
}

impl Sum for Stats {
    fn sum<I: Iterator<Item = Stats>>(iter: I) -> Stats {
        iter.fold(Stats::default(), Add::add)
    }
}
