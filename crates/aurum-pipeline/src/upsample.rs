//! Integer nearest-neighbor upsampling and polarity inversion.
//!
//! The mask is scaled up by an integer factor before tracing so the
//! tracer has enough resolution to produce smooth curves. Nearest
//! neighbor is deliberate: it preserves hard edges, whereas smooth
//! interpolation would blur boundaries into gray and corrupt the
//! bi-level output.

use image::GrayImage;

use crate::types::PipelineError;

/// Upsample a mask by an integer factor using nearest-neighbor lookup.
///
/// Round-trip property: taking every `factor`-th pixel of the result
/// reproduces the input exactly.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidScale`] if `factor` is zero.
pub fn upsample_nearest(mask: &GrayImage, factor: u32) -> Result<GrayImage, PipelineError> {
    if factor == 0 {
        return Err(PipelineError::InvalidScale(factor));
    }

    Ok(GrayImage::from_fn(
        mask.width() * factor,
        mask.height() * factor,
        |x, y| *mask.get_pixel(x / factor, y / factor),
    ))
}

/// Flip mask polarity so 0 = black = foreground, matching the trace
/// engine's input convention.
#[must_use = "returns the inverted mask"]
pub fn invert(mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        image::Luma([255 - mask.get_pixel(x, y).0[0]])
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn checker(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            image::Luma([if (x + y) % 2 == 0 { 255 } else { 0 }])
        })
    }

    #[test]
    fn zero_factor_is_rejected() {
        let mask = GrayImage::new(4, 4);
        let result = upsample_nearest(&mask, 0);
        assert!(matches!(result, Err(PipelineError::InvalidScale(0))));
    }

    #[test]
    fn factor_one_is_identity() {
        let mask = checker(5, 7);
        let up = upsample_nearest(&mask, 1).unwrap();
        assert_eq!(up.as_raw(), mask.as_raw());
    }

    #[test]
    fn dimensions_scale_by_factor() {
        let mask = checker(6, 4);
        let up = upsample_nearest(&mask, 8).unwrap();
        assert_eq!(up.dimensions(), (48, 32));
    }

    #[test]
    fn upsample_then_subsample_round_trips() {
        let mask = checker(9, 5);
        for factor in [2u32, 3, 6, 12] {
            let up = upsample_nearest(&mask, factor).unwrap();
            let down = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
                *up.get_pixel(x * factor, y * factor)
            });
            assert_eq!(down.as_raw(), mask.as_raw(), "factor {factor}");
        }
    }

    #[test]
    fn upsampled_blocks_are_uniform() {
        let mut mask = GrayImage::new(2, 2);
        mask.put_pixel(0, 0, image::Luma([255]));
        let up = upsample_nearest(&mask, 3).unwrap();
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(up.get_pixel(x, y).0[0], 255);
            }
        }
        for y in 0..3 {
            for x in 3..6 {
                assert_eq!(up.get_pixel(x, y).0[0], 0);
            }
        }
    }

    #[test]
    fn invert_flips_binary_values() {
        let mask = checker(4, 4);
        let inverted = invert(&mask);
        for (a, b) in mask.pixels().zip(inverted.pixels()) {
            assert_eq!(255 - a.0[0], b.0[0]);
        }
    }

    #[test]
    fn double_invert_is_identity() {
        let mask = checker(3, 3);
        assert_eq!(invert(&invert(&mask)).as_raw(), mask.as_raw());
    }
}
