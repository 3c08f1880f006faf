mod base;
mod error;
mod partition;
mod report;
mod sieve;
mod worker;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use error::SieveError;
use partition::Range;

#[derive(Parser)]
#[command(name = "segsieve")]
#[command(about = "Parallel segmented prime sieve", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Find all prime numbers in a range using parallel worker threads")]
    Primes {
        #[arg(long, default_value = "1", help = "First number of the range")]
        start: u64,
        #[arg(long, default_value = "100000000", help = "Last number of the range (inclusive)")]
        end: u64,
        #[arg(short, long, default_value = "8", help = "Number of worker threads")]
        workers: usize,
        #[arg(
            short,
            long,
            default_value_t = sieve::DEFAULT_TOP_K,
            help = "How many of the largest primes to report"
        )]
        top: usize,
        #[arg(
            short,
            long,
            help = "Directory for result files (defaults to $XDG_DATA_HOME/segsieve)"
        )]
        output: Option<PathBuf>,
        #[arg(long, help = "Also save every prime to all_primes.txt")]
        save_all: bool,
        #[arg(long, help = "Print every prime found to stdout")]
        list: bool,
    },
    #[command(about = "Cross-check the parallel sieve against a single-threaded sieve")]
    Verify {
        #[arg(long, default_value = "1", help = "First number of the range")]
        start: u64,
        #[arg(long, default_value = "1000000", help = "Last number of the range (inclusive)")]
        end: u64,
        #[arg(short, long, default_value = "8", help = "Number of worker threads")]
        workers: usize,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Primes {
            start,
            end,
            workers,
            top,
            output,
            save_all,
            list,
        } => run_primes(start, end, workers, top, output, save_all, list),
        Commands::Verify {
            start,
            end,
            workers,
        } => run_verify(start, end, workers),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            if e.is_config() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run_primes(
    start: u64,
    end: u64,
    workers: usize,
    top: usize,
    output: Option<PathBuf>,
    save_all: bool,
    list: bool,
) -> Result<ExitCode, SieveError> {
    let range = Range::new(start, end)?;
    let report = sieve::find_primes(range, workers)?;

    log::info!(
        "found {} primes in {:.2}ms",
        report.count(),
        report.elapsed.as_micros() as f64 / 1000.0
    );

    report::persist(&report, output.as_deref(), top, save_all);
    report::print_summary(&report, top, list);

    Ok(ExitCode::SUCCESS)
}

fn run_verify(start: u64, end: u64, workers: usize) -> Result<ExitCode, SieveError> {
    let range = Range::new(start, end)?;
    let report = sieve::find_primes(range, workers)?;
    let expected = sieve::reference_primes(range)?;

    if report.primes() == expected.as_slice() {
        println!(
            "OK: {} primes in [{}, {}] match the single-threaded sieve ({} workers)",
            report.count(),
            start,
            end,
            report.active_workers
        );
        return Ok(ExitCode::SUCCESS);
    }

    let first_diff = report
        .primes()
        .iter()
        .zip(expected.iter())
        .position(|(a, b)| a != b)
        .unwrap_or(report.count().min(expected.len()));

    println!(
        "MISMATCH: parallel sieve found {} primes, reference found {} (first difference at index {})",
        report.count(),
        expected.len(),
        first_diff
    );
    Ok(ExitCode::FAILURE)
}
