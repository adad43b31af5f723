use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{Config, parse_duration};

pub const USAGE: &str = "usage: readbench [OPTIONS] DIR";

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Directory tree to read
    pub dir: PathBuf,

    /// Number of workers reading files concurrently [default: 2]
    #[arg(long)]
    pub workers: Option<usize>,

    /// Minimum time between progress lines per worker, e.g. 10s or 500ms [default: 10s]
    #[arg(long, value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Tab-separated results log to append to [default: benchmarks.csv]
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Optional path to config file (YAML)
    #[arg(long = "config")]
    pub config_path: Option<PathBuf>,

    /// Emit log lines as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl CliOptions {
    /// Flags given on the command line win over the config file.
    pub fn apply_to(&self, cfg: &mut Config) {
        if let Some(workers) = self.workers {
            cfg.workers = workers;
        }
        if let Some(interval) = self.interval {
            cfg.reporting_interval = interval;
        }
        if let Some(output) = &self.output {
            cfg.output = output.clone();
        }
    }
}

pub fn try_parse() -> Result<CliOptions, clap::Error> {
    CliOptions::try_parse()
}
