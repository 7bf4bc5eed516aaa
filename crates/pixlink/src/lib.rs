//! Host side of an image exchange with a remote processing unit.
//!
//! pixlink frames a grayscale image as a fixed-size byte stream, pushes it
//! over a serial-style link, and collects the unit's reply within a deadline.
//!
//! # Crate Structure
//!
//! - [`transport`] — Non-blocking byte links (character devices, Unix sockets)
//! - [`codec`] — Pixel buffers, geometry, and the pad/reconstruct pipeline
//! - [`session`] — Transfer sessions, reply validation, and batch driving

/// Re-export transport types.
pub mod transport {
    pub use pixlink_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use pixlink_codec::*;
}

/// Re-export session types.
pub mod session {
    pub use pixlink_session::*;
}
