use std::num::NonZeroU32;
use std::thread;
use std::time::Duration;

use governor::clock::Clock;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Highest cell rate handed to a quota. Above this the replenish interval would round to zero.
pub(crate) const MAX_CELLS_PER_SEC: u64 = 1_000_000_000;

pub(crate) fn nonzero_cells(cells: u64) -> NonZeroU32 {
    let clamped = cells.clamp(1, u64::from(u32::MAX)) as u32;
    NonZeroU32::new(clamped).unwrap_or(NonZeroU32::MIN)
}

/// Time a `unit`-byte read is worth at `bytes_per_sec`, rounded up to the next nanosecond.
pub(crate) fn read_period(unit: usize, bytes_per_sec: u64) -> Duration {
    let nanos = (unit.max(1) as u128 * 1_000_000_000).div_ceil(u128::from(bytes_per_sec.max(1)));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Whole `unit`-byte reads per second, at least one.
pub(crate) fn reads_per_sec(unit: usize, bytes_per_sec: u64) -> u64 {
    (bytes_per_sec / unit.max(1) as u64).max(1)
}

/// Maps bytes onto limiter cells so that very high byte rates still fit a quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellScale {
    bytes_per_cell: u64,
}

impl CellScale {
    pub(crate) fn for_rate(bytes_per_sec: u64) -> Self {
        Self {
            bytes_per_cell: bytes_per_sec.div_ceil(MAX_CELLS_PER_SEC).max(1),
        }
    }

    pub(crate) fn cells(&self, bytes: u64) -> u64 {
        bytes.div_ceil(self.bytes_per_cell)
    }

    pub(crate) fn cells_per_sec(&self, bytes_per_sec: u64) -> u64 {
        bytes_per_sec / self.bytes_per_cell
    }
}

/// Blocking front-end over a direct governor limiter.
pub(crate) struct Gcra {
    limiter: DefaultDirectRateLimiter,
    burst: NonZeroU32,
}

impl Gcra {
    pub(crate) fn new(cells_per_sec: u64, burst: u64) -> Self {
        let per_sec = nonzero_cells(cells_per_sec.min(MAX_CELLS_PER_SEC));
        Self::from_quota(Quota::per_second(per_sec), burst)
    }

    /// One cell every `period`.
    pub(crate) fn with_period(period: Duration, burst: u64) -> Self {
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(nonzero_cells(MAX_CELLS_PER_SEC)));
        Self::from_quota(quota, burst)
    }

    fn from_quota(quota: Quota, burst: u64) -> Self {
        let burst = nonzero_cells(burst);
        Self {
            limiter: RateLimiter::direct(quota.allow_burst(burst)),
            burst,
        }
    }

    /// Spends the whole burst so pacing starts from an empty bucket.
    pub(crate) fn drain(&self) {
        let _ = self.limiter.check_n(self.burst);
    }

    pub(crate) fn try_one(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub(crate) fn wait_one(&self) {
        while let Err(not_until) = self.limiter.check() {
            thread::sleep(not_until.wait_time_from(self.limiter.clock().now()));
        }
    }

    /// Waits until `cells` cells have been granted, in burst-sized installments.
    pub(crate) fn wait_cells(&self, mut cells: u64) {
        while cells > 0 {
            let take = cells.min(u64::from(self.burst.get()));
            let n = nonzero_cells(take);
            loop {
                match self.limiter.check_n(n) {
                    Ok(Ok(())) => break,
                    Ok(Err(not_until)) => {
                        thread::sleep(not_until.wait_time_from(self.limiter.clock().now()));
                    }
                    // `take` never exceeds the burst.
                    Err(_) => break,
                }
            }
            cells -= take;
        }
    }
}
