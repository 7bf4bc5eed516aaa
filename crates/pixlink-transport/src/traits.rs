use bytes::Bytes;

use crate::error::Result;

/// A byte-oriented link to a remote unit.
///
/// Neither call blocks. `write` enqueues a prefix of `bytes` in order and
/// reports how much it took; the caller retries the rest. A single
/// multi-byte call and a run of single-byte calls are equivalent. `read`
/// returns whatever is currently available, up to `max_bytes`. An empty
/// return means "no data yet", never end-of-stream.
pub trait LinkTransport {
    /// Enqueue a prefix of `bytes` and return its length.
    ///
    /// `Ok(0)` for a non-empty `bytes` means the transmit side is full right
    /// now. A closed link is an error, not a zero count.
    fn write(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Read up to `max_bytes` currently available bytes.
    fn read(&mut self, max_bytes: usize) -> Result<Bytes>;

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str {
        "link"
    }
}

impl<T: LinkTransport + ?Sized> LinkTransport for &mut T {
    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        (**self).write(bytes)
    }

    fn read(&mut self, max_bytes: usize) -> Result<Bytes> {
        (**self).read(max_bytes)
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

impl<T: LinkTransport + ?Sized> LinkTransport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        (**self).write(bytes)
    }

    fn read(&mut self, max_bytes: usize) -> Result<Bytes> {
        (**self).read(max_bytes)
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
