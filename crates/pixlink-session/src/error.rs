use std::fmt;
use std::time::Duration;

use pixlink_codec::CodecError;
use pixlink_transport::TransportError;

use crate::state::SessionState;

/// Session phase in which a transport failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Writing,
    Polling,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Writing => f.write_str("writing"),
            Phase::Polling => f.write_str("polling"),
        }
    }
}

/// Errors that can end an exchange.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The link itself failed.
    #[error("transport error while {phase}: {source}")]
    Transport {
        phase: Phase,
        #[source]
        source: TransportError,
    },

    /// The reply did not complete before the poll deadline.
    #[error("timed out after {waited:?}: received {received} of {expected} bytes")]
    Timeout {
        received: usize,
        expected: usize,
        waited: Duration,
    },

    /// The link refused outbound bytes for the whole write timeout.
    #[error("write stalled for {waited:?}: link accepted {written} of {total} bytes")]
    WriteTimeout {
        written: usize,
        total: usize,
        waited: Duration,
    },

    /// The reply length does not match the reconstruction geometry.
    #[error("reply length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The caller aborted the exchange.
    #[error("exchange cancelled after receiving {received} bytes")]
    Cancelled { received: usize },

    /// Buffer/geometry disagreement outside the reply path.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl SessionError {
    /// Terminal session state this error corresponds to.
    pub fn state(&self) -> SessionState {
        match self {
            SessionError::Transport { .. } => SessionState::TransportError,
            SessionError::Timeout { .. } | SessionError::WriteTimeout { .. } => {
                SessionState::Timeout
            }
            SessionError::LengthMismatch { .. } | SessionError::Codec(_) => {
                SessionState::LengthMismatch
            }
            SessionError::Cancelled { .. } => SessionState::Cancelled,
        }
    }

    /// Bytes received before the failure, when known.
    pub fn received(&self) -> Option<usize> {
        match self {
            SessionError::Timeout { received, .. } | SessionError::Cancelled { received } => {
                Some(*received)
            }
            SessionError::LengthMismatch { actual, .. } => Some(*actual),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
