use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, TransportError};
use crate::traits::LinkTransport;

const UNIX_PREFIX: &str = "unix:";

/// Where the remote unit is reached.
///
/// Parsed from `unix:<socket-path>` or a bare device path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEndpoint {
    /// A bridge daemon listening on a Unix domain socket.
    Unix(PathBuf),
    /// A character device node.
    Device(PathBuf),
}

impl LinkEndpoint {
    /// Open the endpoint, returning an exclusively owned link.
    pub fn open(&self) -> Result<Box<dyn LinkTransport + Send>> {
        self.open_with_baud(None)
    }

    /// Open the endpoint, setting the line speed of a device node.
    ///
    /// Sockets have no line speed; `baud` is ignored for them.
    pub fn open_with_baud(&self, baud: Option<u32>) -> Result<Box<dyn LinkTransport + Send>> {
        #[cfg(unix)]
        {
            match self {
                LinkEndpoint::Unix(path) => Ok(Box::new(crate::unix::UnixLink::connect(path)?)),
                LinkEndpoint::Device(path) => Ok(Box::new(
                    crate::device::DeviceLink::open_with_baud(path, baud)?,
                )),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = baud;
            Err(TransportError::Unsupported(self.to_string()))
        }
    }
}

impl FromStr for LinkEndpoint {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        let input = input.trim();
        if let Some(rest) = input.strip_prefix(UNIX_PREFIX) {
            if rest.is_empty() {
                return Err(TransportError::InvalidEndpoint(input.to_string()));
            }
            return Ok(LinkEndpoint::Unix(PathBuf::from(rest)));
        }
        if input.is_empty() {
            return Err(TransportError::InvalidEndpoint(input.to_string()));
        }
        Ok(LinkEndpoint::Device(PathBuf::from(input)))
    }
}

impl fmt::Display for LinkEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkEndpoint::Unix(path) => write!(f, "{UNIX_PREFIX}{}", path.display()),
            LinkEndpoint::Device(path) => write!(f, "{}", path.display()),
        }
    }
}
