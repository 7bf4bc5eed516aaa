use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Content region the remote unit expects.
pub const DEFAULT_TARGET: Geometry = Geometry::new(254, 254);

/// Canvas actually transmitted and returned.
pub const DEFAULT_PADDED: Geometry = Geometry::new(256, 256);

/// Width and height of a single-channel raster, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of samples (and bytes) in a buffer of this geometry.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when `other` fits inside `self` on both axes.
    pub fn contains(&self, other: &Geometry) -> bool {
        self.width >= other.width && self.height >= other.height
    }

    fn ensure_non_zero(self) -> Result<Self> {
        if self.width == 0 || self.height == 0 {
            return Err(CodecError::InvalidGeometry(self.to_string()));
        }
        Ok(self)
    }
}

impl FromStr for Geometry {
    type Err = CodecError;

    /// Parse `WIDTHxHEIGHT`, e.g. `256x256`.
    fn from_str(input: &str) -> Result<Self> {
        let invalid = || CodecError::InvalidGeometry(input.to_string());
        let (w, h) = input
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = h.trim().parse::<u32>().map_err(|_| invalid())?;
        Geometry::new(width, height)
            .ensure_non_zero()
            .map_err(|_| invalid())
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The target/padded geometry pair both ends agree on out of band.
///
/// The target content is centered inside the padded canvas at
/// `floor((padded - target) / 2)` on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Layout {
    target: Geometry,
    padded: Geometry,
}

impl Layout {
    /// Build a layout, rejecting zero sides and canvases smaller than the target.
    pub fn new(target: Geometry, padded: Geometry) -> Result<Self> {
        let target = target.ensure_non_zero()?;
        let padded = padded.ensure_non_zero()?;
        if !padded.contains(&target) {
            return Err(CodecError::InvalidLayout { target, padded });
        }
        Ok(Self { target, padded })
    }

    pub fn target(&self) -> Geometry {
        self.target
    }

    pub fn padded(&self) -> Geometry {
        self.padded
    }

    /// Top-left corner of the content region inside the padded canvas.
    pub fn offset(&self) -> (u32, u32) {
        (
            (self.padded.width - self.target.width) / 2,
            (self.padded.height - self.target.height) / 2,
        )
    }

    /// Byte count of the transmitted buffer, which is also the reply length.
    pub fn frame_len(&self) -> usize {
        self.padded.area()
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET,
            padded: DEFAULT_PADDED,
        }
    }
}
