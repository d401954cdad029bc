//! Filters, summarises and optionally sorts a speed data CSV.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use speed_tools::cli::{ProcessArgs, classify_process_error, is_informational};
use speed_tools::pipeline::{OutputSinks, Pipeline};
use speed_tools::telemetry::{self, report};
use tracing::{debug, info};

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = telemetry::init("logs/speed_process.log")?;

    let args = match ProcessArgs::try_parse() {
        Ok(args) => args,
        Err(e) if is_informational(&e) => e.exit(),
        Err(e) => {
            debug!(detail = %e, "Command line rejected");
            report(&classify_process_error(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    let pipeline = Pipeline::new(&args.data_file, OutputSinks::new(&args.output_dir))
        .with_sort(args.sort);

    match pipeline.run() {
        Ok(summary) => {
            info!(
                bins = summary.bins,
                binned = summary.binned,
                outliers = summary.outliers,
                skipped_lines = summary.missing_lines.len(),
                "Done"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            report(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}
