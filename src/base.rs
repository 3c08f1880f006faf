use crate::error::SieveError;

/// Allocate a vector of `len` copies of `value`, reporting failure instead of aborting.
pub(crate) fn try_filled_vec<T: Clone>(
    len: usize,
    value: T,
    what: &'static str,
) -> Result<Vec<T>, SieveError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len)
        .map_err(|_| SieveError::Allocation { what, len: len as u64 })?;
    vec.resize(len, value);
    Ok(vec)
}

/// Base Sieve: classic Sieve of Eratosthenes
///
/// Finds every prime up to `limit` (inclusive). Used once per run to produce
/// the small primes that every segment worker strikes with.
/// - Time complexity: O(n log log n)
/// - Space complexity: O(n) - 1 byte per number
pub fn compute_base_primes(limit: u64) -> Result<Vec<u64>, SieveError> {
    if limit < 2 {
        return Ok(vec![]);
    }

    let len = usize::try_from(limit)
        .ok()
        .and_then(|l| l.checked_add(1))
        .ok_or(SieveError::Allocation {
            what: "base sieve",
            len: limit,
        })?;

    let mut is_prime = try_filled_vec(len, true, "base sieve")?;
    is_prime[0] = false;
    is_prime[1] = false;

    let limit = len - 1;
    let mut i = 2;
    while i * i <= limit {
        if is_prime[i] {
            let mut j = i * i;
            while j <= limit {
                is_prime[j] = false;
                j += i;
            }
        }
        i += 1;
    }

    Ok(is_prime
        .iter()
        .enumerate()
        .filter_map(|(num, &prime)| if prime { Some(num as u64) } else { None })
        .collect())
}
