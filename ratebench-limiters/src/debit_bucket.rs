use std::io::{self, Read};

use crate::ReadClose;
use crate::gcra::{CellScale, Gcra};

/// Reads first, then pays for the bytes that actually arrived.
///
/// The bucket is denominated in bytes (coarsened for rates a quota can't express), refills at
/// `bytes_per_sec` and holds one second worth of bytes. Short reads cost proportionally less,
/// which is what makes this variant track the source instead of the buffer size.
pub struct DebitBucketReader<R> {
    inner: R,
    gcra: Gcra,
    scale: CellScale,
}

impl<R: ReadClose> DebitBucketReader<R> {
    pub fn new(inner: R, bytes_per_sec: u64) -> Self {
        let scale = CellScale::for_rate(bytes_per_sec);
        let cells_per_sec = scale.cells_per_sec(bytes_per_sec);
        let gcra = Gcra::new(cells_per_sec, cells_per_sec);
        gcra.drain();

        Self { inner, gcra, scale }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: ReadClose> Read for DebitBucketReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n != 0 {
            self.gcra.wait_cells(self.scale.cells(n as u64));
        }
        Ok(n)
    }
}

impl<R: ReadClose> ReadClose for DebitBucketReader<R> {
    fn close(&mut self) -> io::Result<()> {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Trickle, drain, source};
    use std::time::{Duration, Instant};

    #[test]
    fn reads_everything_no_faster_than_the_limit() {
        let reader = DebitBucketReader::new(source(64 * 1024), 128 * 1024);
        let (total, elapsed) = drain(reader, 4 * 1024);

        assert_eq!(total, 64 * 1024);
        assert!(
            elapsed >= Duration::from_millis(400),
            "finished too fast: {elapsed:?}"
        );
    }

    #[test]
    fn short_reads_are_charged_by_size() {
        // 100 one-byte reads against a 1 KiB/s budget cost ~0.1s, far less than 100 full buffers.
        let mut reader = DebitBucketReader::new(
            Trickle {
                remaining: 100,
                chunk: 1,
                closed: false,
            },
            1024,
        );
        let mut buf = [0u8; 512];
        let started = Instant::now();
        let mut total = 0usize;
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(err) => panic!("read failed: {err}"),
            }
        }

        assert_eq!(total, 100);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn unbounded_rate_does_not_throttle_noticeably() {
        let reader = DebitBucketReader::new(source(8 * 1024 * 1024), u64::MAX);
        let (total, elapsed) = drain(reader, 32 * 1024);

        assert_eq!(total, 8 * 1024 * 1024);
        assert!(elapsed < Duration::from_secs(2), "too slow: {elapsed:?}");
    }
}
