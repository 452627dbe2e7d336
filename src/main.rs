//! Command-line entry point for the lock comparison sweep -- see the library docs for what gets
//! measured, how correctness is verified and how to read the table this prints.

use spin_or_block::{
    sweep::{self, DEFAULT_SCENARIOS},
    types::BenchmarkMode,
};
use log::info;
use structopt::StructOpt;


#[derive(Debug, StructOpt)]
#[structopt(name = "spin-or-block",
            about = "compares hand-rolled spin locks against the OS blocking mutexes over a sweep of contention profiles")]
struct CommandLineOptions {
    /// Runs a no-op-lock-only pass, measuring the harness' own overhead without any correctness
    /// verification -- handy for warming the machine up before taking real measurements
    #[structopt(long)]
    dry_run: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {

    simple_logger::SimpleLogger::new().with_utc_timestamps().init().unwrap_or_else(|_| eprintln!("--> LOGGER WAS ALREADY STARTED"));

    let options = CommandLineOptions::from_args();
    let mode = if options.dry_run {
        BenchmarkMode::DryRun
    } else {
        BenchmarkMode::FullComparison
    };
    let variants = sweep::lock_variants(mode);

    // a verification failure bubbles up here, failing the process with a non-zero exit code
    // (timings taken under a lock that doesn't lock are garbage)
    let reports = sweep::run_sweep(&DEFAULT_SCENARIOS, &variants, mode)?;

    info!("done: {} scenarios measured in '{mode}' mode", reports.len());
    Ok(())
}
