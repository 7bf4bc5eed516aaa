use std::io::{ErrorKind, Read, Write};

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::traits::LinkTransport;

/// Default upper bound for a single non-blocking read.
pub const READ_CHUNK_SIZE: usize = 8 * 1024;

/// How a zero-length `read` from the underlying stream is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EofPolicy {
    /// Zero bytes means nothing has arrived yet (device nodes, FIFOs).
    Empty,
    /// Zero bytes means the peer closed the stream (sockets).
    Disconnect,
}

/// Adapts any non-blocking `Read + Write` stream to [`LinkTransport`].
///
/// `WouldBlock` on read becomes an empty reply and `WouldBlock` on write
/// becomes a zero count. `Interrupted` is retried in both directions.
pub struct StreamLink<S> {
    inner: S,
    eof: EofPolicy,
    scratch: Vec<u8>,
    name: &'static str,
}

impl<S: Read + Write> StreamLink<S> {
    /// Wrap a stream. End-of-stream is treated as "no data yet".
    pub fn new(inner: S) -> Self {
        Self::with_policy(inner, EofPolicy::Empty)
    }

    /// Wrap a stream with an explicit end-of-stream policy.
    pub fn with_policy(inner: S, eof: EofPolicy) -> Self {
        Self {
            inner,
            eof,
            scratch: vec![0u8; READ_CHUNK_SIZE],
            name: "stream",
        }
    }

    /// Override the diagnostic transport name.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the link and return the inner stream.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // The bytes are already queued; the next write pushes them on.
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<S: Read + Write> LinkTransport for StreamLink<S> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        if bytes.is_empty() {
            return Ok(0);
        }

        loop {
            match self.inner.write(bytes) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => {
                    self.flush()?;
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn read(&mut self, max_bytes: usize) -> Result<Bytes> {
        let want = max_bytes.min(self.scratch.len());
        if want == 0 {
            return Ok(Bytes::new());
        }

        loop {
            match self.inner.read(&mut self.scratch[..want]) {
                Ok(0) => {
                    return match self.eof {
                        EofPolicy::Empty => Ok(Bytes::new()),
                        EofPolicy::Disconnect => Err(TransportError::Disconnected),
                    }
                }
                Ok(n) => return Ok(Bytes::copy_from_slice(&self.scratch[..n])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(Bytes::new()),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn transport_name(&self) -> &'static str {
        self.name
    }
}

impl<S> std::fmt::Debug for StreamLink<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamLink")
            .field("name", &self.name)
            .field("eof", &self.eof)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Replays a script of read outcomes; records everything written.
    struct Scripted {
        reads: Vec<std::io::Result<Vec<u8>>>,
        written: Vec<u8>,
        write_hiccups: usize,
    }

    impl Scripted {
        fn new(reads: Vec<std::io::Result<Vec<u8>>>) -> Self {
            Self {
                reads,
                written: Vec::new(),
                write_hiccups: 0,
            }
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.reads.is_empty() {
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            let data = self.reads.remove(0)?;
            let n = data.len().min(buf.len());
            buf[..n].copy_from_slice(&data[..n]);
            Ok(n)
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.write_hiccups > 0 {
                self.write_hiccups -= 1;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            // Accept at most two bytes per call to exercise partial writes.
            let n = buf.len().min(2);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn would_block_reads_as_empty() {
        let mut link = StreamLink::new(Scripted::new(vec![]));
        assert!(link.read(16).unwrap().is_empty());
    }

    #[test]
    fn interrupted_read_retries() {
        let mut link = StreamLink::new(Scripted::new(vec![
            Err(std::io::Error::from(ErrorKind::Interrupted)),
            Ok(b"abc".to_vec()),
        ]));
        assert_eq!(link.read(16).unwrap().as_ref(), b"abc");
    }

    #[test]
    fn read_respects_max_bytes() {
        let mut link = StreamLink::new(Cursor::new(b"abcdef".to_vec()));
        assert_eq!(link.read(4).unwrap().as_ref(), b"abcd");
        assert_eq!(link.read(4).unwrap().as_ref(), b"ef");
        assert!(link.read(4).unwrap().is_empty());
    }

    #[test]
    fn zero_max_bytes_reads_nothing() {
        let mut link = StreamLink::new(Cursor::new(b"abc".to_vec()));
        assert!(link.read(0).unwrap().is_empty());
        assert_eq!(link.read(8).unwrap().as_ref(), b"abc");
    }

    #[test]
    fn eof_with_disconnect_policy_is_error() {
        let mut link =
            StreamLink::with_policy(Cursor::new(Vec::<u8>::new()), EofPolicy::Disconnect);
        let err = link.read(8).unwrap_err();
        assert!(matches!(err, TransportError::Disconnected));
    }

    #[test]
    fn hard_read_error_propagates() {
        let mut link = StreamLink::new(Scripted::new(vec![Err(std::io::Error::from(
            ErrorKind::BrokenPipe,
        ))]));
        let err = link.read(8).unwrap_err();
        assert!(matches!(err, TransportError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn partial_and_blocked_writes_complete_in_order() {
        let mut scripted = Scripted::new(vec![]);
        scripted.write_hiccups = 3;
        let mut link = StreamLink::new(scripted);

        let payload = b"hello world";
        let mut offset = 0;
        let mut stalls = 0;
        while offset < payload.len() {
            match link.write(&payload[offset..]).unwrap() {
                0 => stalls += 1,
                n => offset += n,
            }
        }
        assert_eq!(stalls, 3);
        assert_eq!(link.into_inner().written, payload);
    }

    #[test]
    fn full_transmit_side_returns_without_progress() {
        let mut scripted = Scripted::new(vec![]);
        scripted.write_hiccups = usize::MAX;
        let mut link = StreamLink::new(scripted);

        for _ in 0..3 {
            assert_eq!(link.write(b"frame").unwrap(), 0);
        }
        assert!(link.into_inner().written.is_empty());
    }

    #[test]
    fn interrupted_write_retries() {
        struct Flaky {
            interrupted: bool,
        }
        impl Write for Flaky {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                if !self.interrupted {
                    self.interrupted = true;
                    return Err(std::io::Error::from(ErrorKind::Interrupted));
                }
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::Error::from(ErrorKind::WouldBlock))
            }
        }
        impl Read for Flaky {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Ok(0)
            }
        }

        let mut link = StreamLink::new(Flaky { interrupted: false });
        assert_eq!(link.write(b"abc").unwrap(), 3);
    }

    #[test]
    fn empty_write_is_a_no_op() {
        let mut link = StreamLink::new(Scripted::new(vec![]));
        assert_eq!(link.write(&[]).unwrap(), 0);
    }

    #[test]
    fn zero_length_write_reports_closed() {
        struct Stuck;
        impl Read for Stuck {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Ok(0)
            }
        }
        impl Write for Stuck {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut link = StreamLink::new(Stuck);
        assert!(matches!(link.write(b"x"), Err(TransportError::Closed)));
    }

    #[test]
    fn named_overrides_transport_name() {
        let link = StreamLink::new(Cursor::new(Vec::<u8>::new())).named("loopback");
        assert_eq!(link.transport_name(), "loopback");
    }
}
