use std::io::{self, Read};
use std::thread;
use std::time::{Duration, Instant};

use crate::ReadClose;
use crate::gcra::read_period;

/// Spaces reads evenly, one `buffer_size` read every `buffer_size / bytes_per_sec` seconds, with
/// no burst allowance.
///
/// Grants never accumulate: after idling, the next read goes through at once and the one after it
/// waits a full period again.
pub struct LeakyBucketReader<R> {
    inner: R,
    period: Duration,
    next: Instant,
}

impl<R: ReadClose> LeakyBucketReader<R> {
    pub fn new(inner: R, buffer_size: usize, bytes_per_sec: u64) -> Self {
        let period = read_period(buffer_size, bytes_per_sec);
        Self {
            inner,
            period,
            next: Instant::now() + period,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn pace(&mut self) {
        let now = Instant::now();
        if now < self.next {
            thread::sleep(self.next - now);
        }
        self.next = self.next.max(now) + self.period;
    }
}

impl<R: ReadClose> Read for LeakyBucketReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.pace();
        self.inner.read(buf)
    }
}

impl<R: ReadClose> ReadClose for LeakyBucketReader<R> {
    fn close(&mut self) -> io::Result<()> {
        self.inner.close()
    }
}
