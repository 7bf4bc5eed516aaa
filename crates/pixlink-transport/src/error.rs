use std::path::PathBuf;

/// Errors that can occur on a byte link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the link device.
    #[error("failed to open link device {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to a socket endpoint.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the link.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link accepted zero bytes on write.
    #[error("link closed (write accepted zero bytes)")]
    Closed,

    /// The remote end closed the stream.
    #[error("remote end disconnected")]
    Disconnected,

    /// The endpoint string could not be parsed.
    #[error("invalid link endpoint '{0}'")]
    InvalidEndpoint(String),

    /// The requested line speed has no terminal setting.
    #[error("unsupported baud rate {0}")]
    UnsupportedBaud(u32),

    /// The endpoint kind is not available on this platform.
    #[error("link endpoint '{0}' is not supported on this platform")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
