use pixlink_codec::Geometry;

use crate::error::{Result, SessionError};

/// Check a reply payload against the geometry it will be reconstructed into.
///
/// A session that reports success already guarantees the expected length;
/// this check keeps a short or long payload from ever reaching the codec.
pub fn validate_reply(payload: &[u8], geometry: Geometry) -> Result<()> {
    let expected = geometry.area();
    if payload.len() != expected {
        return Err(SessionError::LengthMismatch {
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}
