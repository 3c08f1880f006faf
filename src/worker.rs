use std::sync::Mutex;

use crate::base::try_filled_vec;
use crate::error::SieveError;
use crate::partition::Chunk;

/// Primes gathered from every worker, in arrival order.
///
/// The vector is only reachable through `append_batch` while workers run and
/// through the consuming `into_inner` once they are all joined.
#[derive(Debug, Default)]
pub struct ResultCollection {
    primes: Mutex<Vec<u64>>,
}

impl ResultCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a worker's whole batch under a single lock acquisition.
    pub fn append_batch(&self, batch: Vec<u64>) -> Result<(), SieveError> {
        let mut primes = self.primes.lock().map_err(|_| SieveError::LockPoisoned)?;
        if primes.is_empty() {
            *primes = batch;
        } else {
            primes.extend(batch);
        }
        Ok(())
    }

    pub fn into_inner(self) -> Result<Vec<u64>, SieveError> {
        self.primes.into_inner().map_err(|_| SieveError::LockPoisoned)
    }
}

#[inline]
fn clear_bit(bits: &mut [u64], idx: usize) {
    let word_idx = idx / 64;
    let bit_idx = idx % 64;
    bits[word_idx] &= !(1_u64 << bit_idx);
}

/// Segment Sieve: bit-packed sieve over one chunk
///
/// Bit `i` of the segment stands for `chunk.start + i`. Each base prime `p`
/// strikes its multiples from `max(p*p, ceil(chunk.start / p) * p)`, so `p`
/// itself survives even when the chunk starts at or below it.
/// - Memory: 1 bit per number in the chunk
/// - `base_primes` must be ascending and cover `isqrt(chunk.end)`
pub fn sieve_chunk(chunk: Chunk, base_primes: &[u64]) -> Result<Vec<u64>, SieveError> {
    let len = usize::try_from(chunk.len()).map_err(|_| SieveError::Allocation {
        what: "segment",
        len: chunk.len(),
    })?;
    let segment_words = len.div_ceil(64);
    let mut segment = try_filled_vec(segment_words, !0_u64, "segment")?;

    for &p in base_primes {
        let square = p * p;
        if square > chunk.end {
            break; // Larger base primes have no composites to strike here
        }

        let mut multiple = square.max(chunk.start.div_ceil(p) * p);
        while multiple <= chunk.end {
            clear_bit(&mut segment, (multiple - chunk.start) as usize);
            multiple += p;
        }
    }

    let mut primes = Vec::new();
    for (word_idx, &word) in segment.iter().enumerate() {
        let mut word = word;

        while word != 0 {
            let bit_idx = word.trailing_zeros() as usize;
            let idx = word_idx * 64 + bit_idx;
            if idx >= len {
                break; // Padding bits of the last word
            }

            let num = chunk.start + idx as u64;
            if num > 1 {
                primes.push(num);
            }

            word &= word - 1; // Clear lowest set bit
        }
    }

    Ok(primes)
}

/// Sieve one chunk and publish its primes. Returns how many were appended.
pub fn run_worker(
    id: usize,
    chunk: Chunk,
    base_primes: &[u64],
    results: &ResultCollection,
) -> Result<usize, SieveError> {
    let primes = sieve_chunk(chunk, base_primes)?;
    let found = primes.len();

    log::debug!(
        "worker {} sieved [{}, {}]: {} primes",
        id,
        chunk.start,
        chunk.end,
        found
    );

    results.append_batch(primes)?;
    Ok(found)
}
