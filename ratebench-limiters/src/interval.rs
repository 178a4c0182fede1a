use std::io::{self, Read};
use std::thread;
use std::time::{Duration, Instant};

use crate::ReadClose;

/// Length of one budget slot.
pub const READ_INTERVAL: Duration = Duration::from_millis(50);

const SLOTS_PER_SEC: u64 = 1_000 / READ_INTERVAL.as_millis() as u64;

/// Deterministic limiter: every [`READ_INTERVAL`] grants `bytes_per_sec / 20` bytes.
///
/// Reads are clamped to what is left in the current slot. Once the slot is spent the reader
/// sleeps until the next one starts. A reader that falls behind by more than a slot restarts its
/// schedule from now instead of catching up. Limits under 20 B/s grant one byte per slot and
/// stretch the slot to `1s / bytes_per_sec`.
pub struct IntervalReader<R> {
    inner: R,
    per_slot: u64,
    slot: Duration,
    slot_start: Instant,
    slot_used: u64,
}

impl<R: ReadClose> IntervalReader<R> {
    pub fn new(inner: R, bytes_per_sec: u64) -> Self {
        let (per_slot, slot) = if bytes_per_sec >= SLOTS_PER_SEC {
            (bytes_per_sec / SLOTS_PER_SEC, READ_INTERVAL)
        } else {
            (1, Duration::from_secs(1) / bytes_per_sec.max(1) as u32)
        };

        Self {
            inner,
            per_slot,
            slot,
            slot_start: Instant::now(),
            slot_used: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn advance_slot(&mut self) {
        let now = Instant::now();
        let next = self.slot_start + self.slot;

        if self.slot_used >= self.per_slot {
            if now < next {
                thread::sleep(next - now);
            }
            self.start_slot(next);
        } else if now >= next {
            self.start_slot(next);
        }
    }

    fn start_slot(&mut self, at: Instant) {
        let now = Instant::now();
        self.slot_start = if now.saturating_duration_since(at) > self.slot {
            now
        } else {
            at
        };
        self.slot_used = 0;
    }
}

impl<R: ReadClose> Read for IntervalReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.advance_slot();

        let budget = self.per_slot - self.slot_used;
        let len = buf.len().min(usize::try_from(budget).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..len])?;
        self.slot_used += n as u64;
        Ok(n)
    }
}

impl<R: ReadClose> ReadClose for IntervalReader<R> {
    fn close(&mut self) -> io::Result<()> {
        self.inner.close()
    }
}
