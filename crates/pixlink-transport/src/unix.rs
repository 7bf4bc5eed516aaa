use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::{EofPolicy, StreamLink};
use crate::traits::LinkTransport;

/// Unix domain socket link.
///
/// Used when the remote unit is reached through a bridge daemon that tunnels
/// the debug port (for example a JTAG-UART server) onto a local socket.
/// The socket is switched to non-blocking mode; a closed peer is reported as
/// [`TransportError::Disconnected`].
pub struct UnixLink {
    link: StreamLink<UnixStream>,
    path: Option<PathBuf>,
}

impl UnixLink {
    /// Connect to a listening socket (blocking connect, non-blocking I/O).
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, "connected to unix socket link");
        let mut link = Self::from_stream(stream)?;
        link.path = Some(path.to_path_buf());
        Ok(link)
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: UnixStream) -> Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self {
            link: StreamLink::with_policy(stream, EofPolicy::Disconnect).named("unix-socket"),
            path: None,
        })
    }

    /// The socket path, when the link was created with [`UnixLink::connect`].
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl LinkTransport for UnixLink {
    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        self.link.write(bytes)
    }

    fn read(&mut self, max_bytes: usize) -> Result<Bytes> {
        self.link.read(max_bytes)
    }

    fn transport_name(&self) -> &'static str {
        "unix-socket"
    }
}

impl Drop for UnixLink {
    fn drop(&mut self) {
        debug!(path = ?self.path, "closing unix socket link");
    }
}

impl std::fmt::Debug for UnixLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixLink").field("path", &self.path).finish()
    }
}
