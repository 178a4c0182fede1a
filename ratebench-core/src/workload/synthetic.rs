use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ratebench_limiters::ReadClose;

const FILLER: u8 = b'A';

/// Bytes produced by synthetic sources since the last reset.
///
/// Cloning shares the underlying counter; the sampler owns the reset.
#[derive(Debug, Clone, Default)]
pub struct SyntheticCounter(Arc<AtomicU64>);

impl SyntheticCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn load(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

/// In-memory source of filler bytes. A budget of 0 never runs dry.
#[derive(Debug)]
pub struct SyntheticSource {
    remaining: Option<u64>,
    counter: SyntheticCounter,
}

impl SyntheticSource {
    pub fn new(budget: u64, counter: SyntheticCounter) -> Self {
        Self {
            remaining: (budget != 0).then_some(budget),
            counter,
        }
    }

    pub fn unbounded(counter: SyntheticCounter) -> Self {
        Self::new(0, counter)
    }
}

impl Read for SyntheticSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = match self.remaining {
            Some(remaining) => buf
                .len()
                .min(usize::try_from(remaining).unwrap_or(usize::MAX)),
            None => buf.len(),
        };
        if n == 0 {
            return Ok(0);
        }

        buf[..n].fill(FILLER);
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= n as u64;
        }
        self.counter.add(n as u64);
        Ok(n)
    }
}

impl ReadClose for SyntheticSource {
    fn close(&mut self) -> io::Result<()> {
        self.remaining = Some(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(source: &mut SyntheticSource, buffer_size: usize) -> u64 {
        let mut buf = vec![0u8; buffer_size];
        let mut total = 0u64;
        loop {
            match source.read(&mut buf) {
                Ok(0) => return total,
                Ok(n) => total += n as u64,
                Err(err) => panic!("read failed: {err}"),
            }
        }
    }

    #[test]
    fn clamps_the_last_read_to_the_budget() {
        let counter = SyntheticCounter::new();
        let mut source = SyntheticSource::new(10_000, counter.clone());

        assert_eq!(read_all(&mut source, 4096), 10_000);
        assert_eq!(counter.load(), 10_000);
    }

    #[test]
    fn fills_with_filler_bytes() {
        let mut source = SyntheticSource::new(8, SyntheticCounter::new());
        let mut buf = [0u8; 16];
        let n = source
            .read(&mut buf)
            .unwrap_or_else(|err| panic!("read failed: {err}"));

        assert_eq!(n, 8);
        assert!(buf[..8].iter().all(|b| *b == FILLER));
        assert!(buf[8..].iter().all(|b| *b == 0));
    }

    #[test]
    fn zero_budget_is_unbounded() {
        let counter = SyntheticCounter::new();
        let mut source = SyntheticSource::unbounded(counter.clone());
        let mut buf = [0u8; 1024];
        for _ in 0..100 {
            let n = source
                .read(&mut buf)
                .unwrap_or_else(|err| panic!("read failed: {err}"));
            assert_eq!(n, 1024);
        }
        assert_eq!(counter.load(), 100 * 1024);
    }

    #[test]
    fn close_ends_the_stream() {
        let mut source = SyntheticSource::unbounded(SyntheticCounter::new());
        source
            .close()
            .unwrap_or_else(|err| panic!("close failed: {err}"));
        assert_eq!(read_all(&mut source, 64), 0);
    }

    #[test]
    fn reset_is_shared_between_clones() {
        let counter = SyntheticCounter::new();
        let clone = counter.clone();
        counter.add(5);
        clone.reset();
        assert_eq!(counter.load(), 0);
    }
}
