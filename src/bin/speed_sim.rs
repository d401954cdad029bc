//! Generates a CSV file of synthetic sensor speed readings.

use std::process::ExitCode;

use anyhow::Result;
use chrono::{Local, Timelike};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use speed_tools::cli::{SimArgs, classify_sim_error, is_informational};
use speed_tools::simulate::{Generator, write_data};
use speed_tools::telemetry::{self, report};
use tracing::{debug, info};

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = telemetry::init("logs/speed_sim.log")?;

    let args = match SimArgs::try_parse() {
        Ok(args) => args,
        Err(e) if is_informational(&e) => e.exit(),
        Err(e) => {
            debug!(detail = %e, "Command line rejected");
            report(&classify_sim_error(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    let now = Local::now();
    let clock = now.time().with_nanosecond(0).unwrap_or(now.time());
    let config = args.to_config(clock);
    let path = args.output_path(now.timestamp());

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let generator = match Generator::new(config, rng) {
        Ok(generator) => generator,
        Err(e) => {
            report(&e);
            return Ok(ExitCode::FAILURE);
        }
    };

    info!(
        sensors = generator.config().sensors,
        sampling = generator.config().sampling,
        duration = generator.config().duration,
        "Generating speed data"
    );

    match write_data(&path, generator) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            report(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}
