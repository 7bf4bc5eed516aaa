//! Canonical grayscale pixel buffers.
//!
//! The remote unit consumes and produces one unsigned byte per pixel, row
//! major, single channel. This crate converts arbitrary raster images into
//! that canonical form (resize, grayscale, center inside a zero canvas) and
//! turns reply bytes back into an image of declared geometry.

pub mod buffer;
pub mod codec;
pub mod error;
pub mod geometry;

pub use buffer::PixelBuffer;
pub use codec::{prepare, reconstruct, RESIZE_FILTER};
pub use error::{CodecError, Result};
pub use geometry::{Geometry, Layout, DEFAULT_PADDED, DEFAULT_TARGET};

/// Re-export of the `image` crate used in this crate's public API.
pub use image;
