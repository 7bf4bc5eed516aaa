use std::fmt;
use std::io;

use pixlink_codec::image::ImageError;
use pixlink_codec::CodecError;
use pixlink_session::{BatchError, ItemError, SessionError};
use pixlink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;
pub const CANCELLED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut => TIMEOUT,
        io::ErrorKind::NotFound
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::InvalidEndpoint(_)
        | TransportError::Unsupported(_)
        | TransportError::UnsupportedBaud(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        TransportError::Open { ref source, .. } | TransportError::Connect { ref source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    match err {
        CodecError::InvalidLayout { .. } | CodecError::InvalidGeometry(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        CodecError::ShapeMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

pub fn image_error(context: &str, err: ImageError) -> CliError {
    let code = match &err {
        ImageError::IoError(source) if source.kind() == io::ErrorKind::PermissionDenied => {
            PERMISSION_DENIED
        }
        ImageError::IoError(_) => FAILURE,
        _ => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport { .. } => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        SessionError::Timeout { .. } | SessionError::WriteTimeout { .. } => {
            CliError::new(TIMEOUT, format!("{context}: {err}"))
        }
        SessionError::LengthMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        SessionError::Cancelled { .. } => CliError::new(CANCELLED, format!("{context}: {err}")),
        SessionError::Codec(err) => codec_error(context, err),
    }
}

pub fn item_error(context: &str, err: ItemError) -> CliError {
    match err {
        ItemError::Exchange(err) => session_error(context, err),
        ItemError::Load { path, source } => {
            image_error(&format!("{context}: failed to load {}", path.display()), source)
        }
        ItemError::OutputDir { path, source } => io_error(
            &format!("{context}: failed to create {}", path.display()),
            source,
        ),
        ItemError::Persist { path, source } => {
            image_error(&format!("{context}: failed to save {}", path.display()), source)
        }
    }
}

/// Map a batch abort to the exit code of the item that caused it.
pub fn batch_error(err: BatchError) -> CliError {
    let context = format!("batch aborted at item {} ({})", err.index, err.input.display());
    item_error(&context, err.source)
}
