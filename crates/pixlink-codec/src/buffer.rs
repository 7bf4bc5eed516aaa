use bytes::Bytes;
use image::GrayImage;

use crate::codec::reconstruct;
use crate::error::{CodecError, Result};
use crate::geometry::Geometry;

/// The exact byte sequence exchanged with the remote unit.
///
/// One unsigned byte per pixel, row major, single channel. The length always
/// equals `geometry.area()`; a buffer is never partially populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    geometry: Geometry,
    data: Bytes,
}

impl PixelBuffer {
    /// Wrap raw samples, checking them against `geometry`.
    pub fn from_raw(geometry: Geometry, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.len() != geometry.area() {
            return Err(CodecError::ShapeMismatch {
                geometry,
                expected: geometry.area(),
                actual: data.len(),
            });
        }
        Ok(Self { geometry, data })
    }

    /// Take the samples of a grayscale image.
    pub fn from_image(image: GrayImage) -> Self {
        let geometry = Geometry::new(image.width(), image.height());
        Self {
            geometry,
            data: Bytes::from(image.into_raw()),
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cheap clone of the underlying bytes.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Rebuild the grayscale image these samples describe.
    pub fn to_image(&self) -> Result<GrayImage> {
        reconstruct(&self.data, self.geometry)
    }
}

impl AsRef<[u8]> for PixelBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
