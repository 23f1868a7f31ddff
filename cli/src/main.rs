mod args;
mod runner;

use std::error::Error as _;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use crate::args::Cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let summary = match runner::run(&cli) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                error!("  caused by: {}", cause);
                source = cause.source();
            }
            return ExitCode::FAILURE;
        }
    };

    info!("=== CRC Complete ===");
    info!("Frames: {}", summary.stats.frames_processed);
    info!("Failed: {}", summary.stats.frames_failed);
    info!("Bytes: {}", summary.stats.bytes_hashed);
    info!("Segments: {}", cli.segments);
    if summary.stats.sink_errors > 0 {
        error!(
            "{} records could not be written to the CRC log",
            summary.stats.sink_errors
        );
    }

    let Some(comparison) = summary.comparison else {
        return ExitCode::SUCCESS;
    };

    if comparison.is_clean() {
        info!("All {} frames match the reference", comparison.matched);
        return ExitCode::SUCCESS;
    }

    for mismatch in &comparison.mismatches {
        error!(
            "VideoFrame {} crc {:08X} expected {:08X}",
            mismatch.index, mismatch.actual, mismatch.expected
        );
    }
    if !comparison.missing.is_empty() {
        error!(
            "{} reference frames were not produced",
            comparison.missing.len()
        );
    }
    if !comparison.extra.is_empty() {
        error!(
            "{} frames are missing from the reference",
            comparison.extra.len()
        );
    }
    ExitCode::FAILURE
}
