use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::error::{CodecError, Result};
use crate::geometry::{Geometry, Layout};

/// Interpolation used when the source does not already match the target size.
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Convert a source image into the canonical padded buffer.
///
/// The image is resized to the layout's target geometry (only when its size
/// differs), converted to 8-bit grayscale, then pasted into a zero-filled
/// canvas of the padded geometry at the centered offset. The source is left
/// untouched.
pub fn prepare(image: &DynamicImage, layout: &Layout) -> PixelBuffer {
    let target = layout.target();
    let source = if image.width() != target.width || image.height() != target.height {
        debug!(
            from = %Geometry::new(image.width(), image.height()),
            to = %target,
            "resizing source image"
        );
        Cow::Owned(image.resize_exact(target.width, target.height, RESIZE_FILTER))
    } else {
        Cow::Borrowed(image)
    };
    let gray = source.to_luma8();

    let padded = layout.padded();
    let (x, y) = layout.offset();
    let mut canvas = GrayImage::new(padded.width, padded.height);
    imageops::replace(&mut canvas, &gray, i64::from(x), i64::from(y));

    PixelBuffer::from_image(canvas)
}

/// Map reply bytes row-major into a grayscale image of `geometry`.
///
/// Fails with [`CodecError::ShapeMismatch`] unless the byte count equals
/// `geometry.width * geometry.height`.
pub fn reconstruct(bytes: &[u8], geometry: Geometry) -> Result<GrayImage> {
    let shape_mismatch = || CodecError::ShapeMismatch {
        geometry,
        expected: geometry.area(),
        actual: bytes.len(),
    };
    if bytes.len() != geometry.area() {
        return Err(shape_mismatch());
    }
    GrayImage::from_raw(geometry.width, geometry.height, bytes.to_vec()).ok_or_else(shape_mismatch)
}

#[cfg(test)]
mod tests {
    use image::{Luma, Rgb, RgbImage};
    use proptest::prelude::*;

    use super::*;

    fn gradient(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([((x * 7 + y * 13) % 251 + 1) as u8]))
    }

    #[test]
    fn default_layout_pads_with_one_pixel_border() {
        let source = DynamicImage::ImageLuma8(GrayImage::from_pixel(254, 254, Luma([200])));
        let buffer = prepare(&source, &Layout::default());

        assert_eq!(buffer.len(), 256 * 256);
        let bytes = buffer.as_bytes();
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[255], 0);
        assert_eq!(bytes[256], 0);
        assert_eq!(bytes[257], 200);
        assert_eq!(bytes[256 * 255 - 2], 200);
        assert_eq!(bytes[256 * 256 - 1], 0);
    }

    #[test]
    fn color_input_becomes_single_channel() {
        let rgb = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let layout = Layout::new(Geometry::new(4, 4), Geometry::new(4, 4)).unwrap();
        let buffer = prepare(&DynamicImage::ImageRgb8(rgb), &layout);
        assert_eq!(buffer.len(), 16);
        assert!(buffer.as_bytes().iter().all(|&b| b == 255));
    }

    #[test]
    fn mismatched_size_is_resized_to_target() {
        let source = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 32, Luma([90])));
        let layout = Layout::new(Geometry::new(16, 16), Geometry::new(20, 18)).unwrap();
        let buffer = prepare(&source, &layout);

        assert_eq!(buffer.geometry(), Geometry::new(20, 18));
        let image = buffer.to_image().unwrap();
        assert_eq!(image.get_pixel(0, 0), &Luma([0]));
        // A flat source stays flat through interpolation, give or take rounding.
        assert!((88..=92).contains(&image.get_pixel(2, 1).0[0]));
        assert!((88..=92).contains(&image.get_pixel(17, 16).0[0]));
        assert_eq!(image.get_pixel(18, 17), &Luma([0]));
    }

    #[test]
    fn prepare_leaves_source_untouched() {
        let original = gradient(10, 6);
        let source = DynamicImage::ImageLuma8(original.clone());
        let layout = Layout::new(Geometry::new(5, 5), Geometry::new(8, 8)).unwrap();
        let _ = prepare(&source, &layout);
        assert_eq!(source.as_luma8(), Some(&original));
    }

    #[test]
    fn reconstruct_rejects_short_buffers() {
        let err = reconstruct(&[0u8; 10], Geometry::new(4, 4)).unwrap_err();
        assert!(matches!(
            err,
            CodecError::ShapeMismatch {
                expected: 16,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn reconstruct_rejects_long_buffers() {
        assert!(reconstruct(&[0u8; 17], Geometry::new(4, 4)).is_err());
    }

    #[test]
    fn reconstruct_maps_row_major() {
        let bytes: Vec<u8> = (0..12).collect();
        let image = reconstruct(&bytes, Geometry::new(4, 3)).unwrap();
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(image.get_pixel(3, 0), &Luma([3]));
        assert_eq!(image.get_pixel(0, 2), &Luma([8]));
    }

    fn layout_strategy() -> impl Strategy<Value = Layout> {
        (1u32..24, 1u32..24, 0u32..7, 0u32..7).prop_map(|(tw, th, pw, ph)| {
            Layout::new(Geometry::new(tw, th), Geometry::new(tw + pw, th + ph))
                .expect("padded is never smaller than target")
        })
    }

    proptest! {
        #[test]
        fn prepared_length_always_equals_padded_area(
            layout in layout_strategy(),
            src_w in 1u32..40,
            src_h in 1u32..40,
        ) {
            let source = DynamicImage::ImageLuma8(gradient(src_w, src_h));
            let buffer = prepare(&source, &layout);

            prop_assert_eq!(buffer.len(), layout.padded().area());
            prop_assert_eq!(buffer.geometry(), layout.padded());

            // Everything outside the centered content region is zero.
            let (ox, oy) = layout.offset();
            let target = layout.target();
            let image = buffer.to_image().unwrap();
            for (x, y, pixel) in image.enumerate_pixels() {
                let inside = x >= ox && x < ox + target.width && y >= oy && y < oy + target.height;
                if !inside {
                    prop_assert_eq!(pixel.0[0], 0);
                }
            }
        }

        #[test]
        fn content_region_equals_source_when_sizes_match(layout in layout_strategy()) {
            let target = layout.target();
            let source = gradient(target.width, target.height);
            let buffer = prepare(&DynamicImage::ImageLuma8(source.clone()), &layout);

            let (ox, oy) = layout.offset();
            let image = buffer.to_image().unwrap();
            for (x, y, pixel) in source.enumerate_pixels() {
                prop_assert_eq!(image.get_pixel(x + ox, y + oy), pixel);
            }
        }

        #[test]
        fn reconstruct_then_serialize_is_identity(
            (w, h, bytes) in (1u32..32, 1u32..32).prop_flat_map(|(w, h)| {
                (Just(w), Just(h), proptest::collection::vec(any::<u8>(), (w * h) as usize))
            })
        ) {
            let image = reconstruct(&bytes, Geometry::new(w, h)).unwrap();
            prop_assert_eq!(image.into_raw(), bytes);
        }
    }
}
