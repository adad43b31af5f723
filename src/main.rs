use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use tracing::{error, info};

use readbench::output::{ResultsLog, ResultsLogError};
use readbench::{cli, config, logging, pipeline, util};

fn main() -> Result<ExitCode> {
    let cli_opts = match cli::try_parse() {
        Ok(opts) => opts,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{}", cli::USAGE);
            return Ok(ExitCode::from(1));
        }
    };

    logging::init_logging(cli_opts.json_logs);

    let mut cfg = config::load_config(cli_opts.config_path.as_deref())?;
    cli_opts.apply_to(&mut cfg);
    cfg.validate()?;

    info!(
        "traversing {} with {} workers",
        cli_opts.dir.display(),
        cfg.workers
    );

    let results_log = match ResultsLog::open(&cfg.output) {
        Ok(log) => Some(log),
        Err(err @ ResultsLogError::Create { .. }) => {
            error!("{err}");
            return Ok(ExitCode::from(2));
        }
        Err(err) => {
            error!("{err}");
            None
        }
    };

    let report = pipeline::run_traversal(&cfg, &cli_opts.dir);

    info!(
        "{} files, {} dirs, {}, {}s, {}/s",
        report.stats.files,
        report.stats.dirs,
        util::format_bytes(report.stats.bytes),
        report.elapsed_seconds(),
        util::format_bytes(report.bytes_per_second())
    );

    if let Some(mut log) = results_log {
        if let Err(err) = log.append(&report) {
            error!("{err}");
        }
        if let Err(err) = log.close() {
            error!("{err}");
        }
    }

    Ok(ExitCode::SUCCESS)
}
