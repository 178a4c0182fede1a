use std::io::{self, Read};

use crate::ReadClose;
use crate::gcra::{Gcra, read_period, reads_per_sec};

fn drained_bucket(buffer_size: usize, bytes_per_sec: u64) -> (Gcra, u64) {
    let burst = reads_per_sec(buffer_size, bytes_per_sec);
    let gcra = Gcra::with_period(read_period(buffer_size, bytes_per_sec), burst);
    gcra.drain();
    (gcra, burst)
}

/// Waits for a read token before every read.
///
/// One token admits one read of up to `buffer_size` bytes. A token is minted every
/// `buffer_size / bytes_per_sec` seconds and the bucket holds one second worth of tokens (at least
/// one). The bucket starts empty, so bursting only happens after the reader has been idle.
pub struct TokenBucketReader<R> {
    inner: R,
    gcra: Gcra,
}

impl<R: ReadClose> TokenBucketReader<R> {
    pub fn new(inner: R, buffer_size: usize, bytes_per_sec: u64) -> Self {
        let (gcra, _) = drained_bucket(buffer_size, bytes_per_sec);
        Self { inner, gcra }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: ReadClose> Read for TokenBucketReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.gcra.wait_one();
        self.inner.read(buf)
    }
}

impl<R: ReadClose> ReadClose for TokenBucketReader<R> {
    fn close(&mut self) -> io::Result<()> {
        self.inner.close()
    }
}

/// Same bucket as [`TokenBucketReader`], but reads only ever happen in full bursts.
///
/// While tokens are available reads go straight through. Once the bucket is dry the reader waits
/// until it is full again and then spends the whole burst back to back.
pub struct BurstOnlyReader<R> {
    inner: R,
    gcra: Gcra,
    burst: u64,
    credit: u64,
}

impl<R: ReadClose> BurstOnlyReader<R> {
    pub fn new(inner: R, buffer_size: usize, bytes_per_sec: u64) -> Self {
        let (gcra, burst) = drained_bucket(buffer_size, bytes_per_sec);
        Self {
            inner,
            gcra,
            burst,
            credit: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: ReadClose> Read for BurstOnlyReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.credit > 0 {
            self.credit -= 1;
        } else if !self.gcra.try_one() {
            self.gcra.wait_cells(self.burst);
            self.credit = self.burst - 1;
        }
        self.inner.read(buf)
    }
}

impl<R: ReadClose> ReadClose for BurstOnlyReader<R> {
    fn close(&mut self) -> io::Result<()> {
        self.inner.close()
    }
}
