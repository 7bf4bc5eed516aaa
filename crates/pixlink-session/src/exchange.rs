use std::time::{Duration, Instant};

use pixlink_codec::image::GrayImage;
use pixlink_codec::{reconstruct, CodecError, Layout, PixelBuffer};
use pixlink_transport::LinkTransport;
use tracing::{info, warn};

use crate::cancel::CancelFlag;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::session::{Reply, TransferSession};
use crate::validator::validate_reply;

/// Outcome of a successful exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// The reply, reconstructed at the padded geometry.
    pub image: GrayImage,
    pub stats: ExchangeStats,
}

/// Byte and timing figures for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeStats {
    pub sent: usize,
    pub received: usize,
    pub discarded: usize,
    pub reads: usize,
    /// Time spent polling for the reply.
    pub waited: Duration,
    /// Wall-clock time of the whole exchange, settle delay included.
    pub elapsed: Duration,
}

/// Push a prepared buffer through the link and rebuild the reply.
///
/// The outbound buffer must already have the layout's padded geometry; the
/// reply is expected to have the same length. A reply of any other length
/// is rejected before reconstruction.
pub fn exchange<T: LinkTransport + ?Sized>(
    link: &mut T,
    buffer: &PixelBuffer,
    layout: &Layout,
    config: &SessionConfig,
    cancel: Option<&CancelFlag>,
) -> Result<Exchange> {
    check_outbound(buffer, layout)?;

    let started = Instant::now();
    info!(
        bytes = buffer.len(),
        link = link.transport_name(),
        settle = ?config.settle_delay,
        deadline = ?config.poll_deadline,
        "starting exchange"
    );

    let mut session = TransferSession::new(link, buffer, layout.frame_len(), config.clone());
    if let Some(cancel) = cancel {
        session = session.with_cancel(cancel.clone());
    }
    let reply = session.run().inspect_err(|err| {
        warn!(error = %err, "exchange failed");
    })?;

    complete(buffer, layout, reply, started.elapsed())
}

pub(crate) fn check_outbound(buffer: &PixelBuffer, layout: &Layout) -> Result<()> {
    if buffer.geometry() != layout.padded() {
        return Err(CodecError::ShapeMismatch {
            geometry: layout.padded(),
            expected: layout.frame_len(),
            actual: buffer.len(),
        }
        .into());
    }
    Ok(())
}

pub(crate) fn complete(
    buffer: &PixelBuffer,
    layout: &Layout,
    reply: Reply,
    elapsed: Duration,
) -> Result<Exchange> {
    validate_reply(&reply.payload, layout.padded())?;
    let image = reconstruct(&reply.payload, layout.padded())?;

    let stats = ExchangeStats {
        sent: buffer.len(),
        received: reply.payload.len(),
        discarded: reply.discarded,
        reads: reply.reads,
        waited: reply.waited,
        elapsed,
    };
    info!(
        received = stats.received,
        discarded = stats.discarded,
        reads = stats.reads,
        elapsed = ?stats.elapsed,
        "exchange complete"
    );
    Ok(Exchange { image, stats })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pixlink_codec::image::{DynamicImage, Luma};
    use pixlink_codec::{prepare, Geometry};

    use super::*;
    use crate::error::SessionError;
    use crate::testing::{quick_config, FakeUnit, ScriptedLink};

    #[test]
    fn cyclic_reply_reconstructs_at_default_layout() {
        let layout = Layout::default();
        let source = DynamicImage::ImageLuma8(GrayImage::from_pixel(254, 254, Luma([128])));
        let buffer = prepare(&source, &layout);
        let mut unit = FakeUnit::cyclic(layout.frame_len(), Duration::from_millis(20));

        let config = SessionConfig {
            settle_delay: Duration::from_millis(5),
            poll_deadline: Duration::from_secs(5),
            ..SessionConfig::default()
        };
        let exchange = exchange(&mut unit, &buffer, &layout, &config, None).unwrap();

        assert_eq!(exchange.stats.sent, 65536);
        assert_eq!(exchange.stats.received, 65536);
        assert_eq!(exchange.image.dimensions(), (256, 256));
        for (c, r, pixel) in exchange.image.enumerate_pixels() {
            assert_eq!(pixel.0[0] as u32, (r * 256 + c) % 256);
        }
    }

    #[test]
    fn outbound_must_match_padded_geometry() {
        let layout = Layout::new(Geometry::new(2, 2), Geometry::new(4, 4)).unwrap();
        let wrong = PixelBuffer::from_raw(Geometry::new(2, 2), vec![0u8; 4]).unwrap();
        let mut link = ScriptedLink::new();

        let err = exchange(&mut link, &wrong, &layout, &quick_config(), None).unwrap_err();
        assert!(matches!(err, SessionError::Codec(CodecError::ShapeMismatch { .. })));
        assert_eq!(link.write_calls, 0);
    }

    #[test]
    fn timeout_surfaces_partial_count() {
        let layout = Layout::new(Geometry::new(2, 2), Geometry::new(4, 4)).unwrap();
        let buffer = PixelBuffer::from_raw(layout.padded(), vec![1u8; 16]).unwrap();
        let mut link = ScriptedLink::new().then_data(&[9; 10]);
        let config = SessionConfig {
            poll_deadline: Duration::from_millis(30),
            ..quick_config()
        };

        let err = exchange(&mut link, &buffer, &layout, &config, None).unwrap_err();
        assert_eq!(err.received(), Some(10));
    }

    #[test]
    fn short_reply_never_reaches_reconstruction() {
        let layout = Layout::new(Geometry::new(2, 2), Geometry::new(2, 2)).unwrap();
        let buffer = PixelBuffer::from_raw(layout.padded(), vec![1u8; 4]).unwrap();
        let reply = Reply {
            payload: bytes::Bytes::from_static(&[1, 2, 3]),
            discarded: 0,
            reads: 1,
            waited: Duration::ZERO,
        };

        let err = complete(&buffer, &layout, reply, Duration::ZERO).unwrap_err();
        assert!(matches!(
            err,
            SessionError::LengthMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn echo_unit_returns_prepared_image() {
        let layout = Layout::new(Geometry::new(6, 6), Geometry::new(8, 8)).unwrap();
        let source = DynamicImage::ImageLuma8(GrayImage::from_fn(6, 6, |x, y| {
            Luma([(x + y * 6) as u8 + 1])
        }));
        let buffer = prepare(&source, &layout);
        let mut unit = FakeUnit::echo(layout.frame_len(), Duration::ZERO);

        let exchange = exchange(&mut unit, &buffer, &layout, &quick_config(), None).unwrap();
        assert_eq!(exchange.image.as_raw().as_slice(), buffer.as_bytes());
        assert_eq!(unit.exchanges(), 1);
    }
}
