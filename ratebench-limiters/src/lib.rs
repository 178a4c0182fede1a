//! Rate-limited readers exercised by the benchmark harness.
//!
//! Every reader wraps a [`ReadClose`] source and releases at most a configured number of bytes
//! per second. They differ only in *when* the wait happens:
//!
//! - [`TokenBucketReader`]: waits for a read token before touching the source, bursts up to one
//!   second worth of reads after idling.
//! - [`BurstOnlyReader`]: the same bucket, but once dry it waits for a full refill and then reads
//!   the whole burst at once.
//! - [`DebitBucketReader`]: reads first, then pays for the bytes it actually got.
//! - [`LeakyBucketReader`]: spaces reads evenly, idle time is never banked.
//! - [`IntervalReader`]: slices each second into fixed intervals with a byte budget per interval.
//!
//! All of them block the calling thread. Run them on a blocking thread pool when driven from an
//! async runtime.

mod debit_bucket;
mod gcra;
mod interval;
mod leaky_bucket;
mod token_bucket;

use std::io::{self, Read};
use std::net::{Shutdown, TcpStream};

pub use debit_bucket::DebitBucketReader;
pub use interval::{IntervalReader, READ_INTERVAL};
pub use leaky_bucket::LeakyBucketReader;
pub use token_bucket::{BurstOnlyReader, TokenBucketReader};

/// A byte source that can be explicitly closed.
pub trait ReadClose: Read + Send {
    fn close(&mut self) -> io::Result<()>;
}

pub type BoxedSource = Box<dyn ReadClose>;

impl<T: ReadClose + ?Sized> ReadClose for Box<T> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl ReadClose for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            // Peer already hung up.
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

impl ReadClose for io::Cursor<Vec<u8>> {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ReadClose for io::Empty {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
