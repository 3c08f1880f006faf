use std::thread;
use std::time::{Duration, Instant};

use crate::base::compute_base_primes;
use crate::error::SieveError;
use crate::partition::{Chunk, Range, partition};
use crate::worker::{ResultCollection, run_worker};

/// Number of largest primes reported by default.
pub const DEFAULT_TOP_K: usize = 10;

/// Outcome of one parallel sieve run.
#[derive(Debug, Clone)]
pub struct PrimeReport {
    pub range: Range,
    pub requested_workers: usize,
    pub active_workers: usize,
    pub elapsed: Duration,
    primes: Vec<u64>,
}

impl PrimeReport {
    /// Every prime in the range, ascending.
    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    pub fn count(&self) -> usize {
        self.primes.len()
    }

    pub fn sum(&self) -> u128 {
        self.primes.iter().map(|&p| p as u128).sum()
    }

    /// The last `min(k, count)` primes, ascending.
    pub fn top_k(&self, k: usize) -> &[u64] {
        &self.primes[self.primes.len().saturating_sub(k)..]
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Parallel Segmented Sieve with static partitioning
///
/// Computes the base primes up to `isqrt(end)`, splits the range into at most
/// `num_workers` chunks and sieves each chunk on its own scoped thread. Workers
/// publish whole batches into a shared `ResultCollection`; it is only read back
/// after every worker has been joined, then sorted.
/// - Any worker failure aborts the run, partial results are discarded
/// - Elapsed time covers base sieve through the final sort
pub fn find_primes(range: Range, num_workers: usize) -> Result<PrimeReport, SieveError> {
    if num_workers == 0 {
        return Err(SieveError::NoWorkers);
    }

    let started = Instant::now();

    let base_primes = compute_base_primes(range.end().isqrt())?;
    let chunks = partition(range, num_workers)?;

    log::info!(
        "sieving [{}, {}] with {} base primes across {} chunks",
        range.start(),
        range.end(),
        base_primes.len(),
        chunks.len()
    );
    if chunks.len() < num_workers {
        log::warn!(
            "range too small for {} workers, dispatching {}",
            num_workers,
            chunks.len()
        );
    }

    let results = ResultCollection::new();

    fan_out(&chunks, |id, chunk| run_worker(id, chunk, &base_primes, &results))?;

    let mut primes = results.into_inner()?;
    primes.sort_unstable();

    let elapsed = started.elapsed();

    Ok(PrimeReport {
        range,
        requested_workers: num_workers,
        active_workers: chunks.len(),
        elapsed,
        primes,
    })
}

/// Run `work` for every chunk on its own scoped thread and join them all.
///
/// Every spawned thread is joined before returning, even after a failure; the
/// first error in chunk order is returned. A panicking worker becomes
/// `SieveError::WorkerPanicked`.
fn fan_out<F>(chunks: &[Chunk], work: F) -> Result<(), SieveError>
where
    F: Fn(usize, Chunk) -> Result<usize, SieveError> + Sync,
{
    let outcomes: Vec<Result<usize, SieveError>> = thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .iter()
            .enumerate()
            .map(|(id, &chunk)| {
                let work = &work;
                thread::Builder::new()
                    .name(format!("sieve-{}", id))
                    .spawn_scoped(scope, move || work(id, chunk))
                    .map_err(|source| SieveError::Spawn { id, source })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(id, handle)| {
                handle?
                    .join()
                    .unwrap_or(Err(SieveError::WorkerPanicked { id }))
            })
            .collect()
    });

    for outcome in outcomes {
        outcome?;
    }
    Ok(())
}

/// Single-threaded sieve over the whole range, used to cross-check `find_primes`.
pub fn reference_primes(range: Range) -> Result<Vec<u64>, SieveError> {
    let mut primes = compute_base_primes(range.end())?;
    primes.retain(|&p| p >= range.start());
    Ok(primes)
}
