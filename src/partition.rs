use crate::error::SieveError;

/// Largest accepted upper bound. Keeps `p * p`, `ceil(start / p) * p` and
/// every chunk boundary well inside `u64`.
pub const MAX_END: u64 = 1 << 62;

/// Inclusive range of numbers to sieve. Only constructible through validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: u64,
    end: u64,
}

impl Range {
    pub fn new(start: u64, end: u64) -> Result<Self, SieveError> {
        if start < 1 {
            return Err(SieveError::StartBelowOne);
        }
        if end < start {
            return Err(SieveError::InvalidRange { start, end });
        }
        if end > MAX_END {
            return Err(SieveError::TooLarge { end, max: MAX_END });
        }
        Ok(Range { start, end })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of integers covered, `end - start + 1`.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Contiguous sub-range owned by exactly one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: u64,
    pub end: u64,
}

impl Chunk {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Split `range` into at most `num_workers` contiguous, non-overlapping chunks.
///
/// Every chunk holds `ceil(len / num_workers)` numbers except possibly the last.
/// When the range is too small for the requested worker count, fewer chunks are
/// produced; that is not an error.
pub fn partition(range: Range, num_workers: usize) -> Result<Vec<Chunk>, SieveError> {
    if num_workers == 0 {
        return Err(SieveError::NoWorkers);
    }

    let workers = num_workers as u64;
    let chunk_size = range.len().div_ceil(workers);
    let mut chunks = Vec::new();

    for i in 0..workers {
        // checked_* plus MAX_END rule out overflow; a start past the end stops the loop
        let chunk_start = match i
            .checked_mul(chunk_size)
            .and_then(|offset| range.start.checked_add(offset))
        {
            Some(s) if s <= range.end => s,
            _ => break,
        };
        let chunk_end = chunk_start
            .saturating_add(chunk_size - 1)
            .min(range.end);

        chunks.push(Chunk {
            start: chunk_start,
            end: chunk_end,
        });
    }

    Ok(chunks)
}
