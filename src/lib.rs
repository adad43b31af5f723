//! Parallel read throughput benchmark.
//!
//! Walks a directory tree, reads every regular file through a fixed pool of
//! worker threads, and reports files, directories, bytes and bandwidth.

pub mod cli;
pub mod config;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod reader;
pub mod stats;
pub mod util;
