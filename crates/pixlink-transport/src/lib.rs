//! Non-blocking byte link abstraction.
//!
//! A link moves raw bytes between the host and a remote processing unit:
//! - Character devices (serial ttys, JTAG-UART bridge nodes)
//! - Unix domain sockets (debug-port tunnels exposed by a bridge daemon)
//!
//! This is the lowest layer of pixlink. Everything else builds on top of
//! the [`LinkTransport`] trait provided here.

pub mod endpoint;
pub mod error;
pub mod stream;
pub mod traits;

#[cfg(unix)]
pub mod device;
#[cfg(unix)]
pub mod unix;

pub use endpoint::LinkEndpoint;
pub use error::{Result, TransportError};
pub use stream::{EofPolicy, StreamLink, READ_CHUNK_SIZE};
pub use traits::LinkTransport;

#[cfg(unix)]
pub use device::{DeviceLink, SUPPORTED_BAUD_RATES};
#[cfg(unix)]
pub use unix::UnixLink;
