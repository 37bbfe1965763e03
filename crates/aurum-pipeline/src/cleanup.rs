//! Mask cleanup: denoise, component filtering, closing, border clear.
//!
//! Turns the raw segmentation decision into a geometrically sound
//! binary raster. Steps, in order:
//!
//! 1. 3x3 median filter to remove salt-and-pepper noise from clustering.
//! 2. 8-connected component filter dropping any foreground component
//!    with pixel area below `max(16, 0.0002 * width * height)`.
//! 3. Morphological closing (small kernel, 1 iteration) to merge
//!    near-adjacent fragments and smooth jagged boundaries.
//! 4. A fixed-width border frame forced to background, preventing
//!    hairline artifacts at image edges in the traced output.
//!
//! Output values stay strictly in `{0, 255}` and dimensions are
//! unchanged. Cleaning an already-clean mask is a fixed point.

use std::collections::HashMap;

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::region_labelling::{Connectivity, connected_components};

/// Width of the border frame forced to background, in pixels.
pub const BORDER_CLEAR_PX: u32 = 2;

/// Minimum surviving component area for a mask of the given size.
///
/// Scales with resolution (0.02% of the pixel count) with a fixed
/// floor of 16 so tiny images still drop sub-pixel noise.
#[must_use]
pub fn min_component_area(width: u32, height: u32) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = (0.0002 * f64::from(width) * f64::from(height)) as u32;
    scaled.max(16)
}

/// Run the full cleanup sequence on a segmentation mask.
#[must_use = "returns the cleaned mask"]
pub fn clean_mask(mask: &GrayImage) -> GrayImage {
    let denoised = imageproc::filter::median_filter(mask, 1, 1);
    let filtered = remove_small_components(
        &denoised,
        min_component_area(mask.width(), mask.height()),
    );
    let mut closed = imageproc::morphology::close(&filtered, Norm::LInf, 1);
    clear_border(&mut closed, BORDER_CLEAR_PX);
    closed
}

/// Drop every 8-connected foreground component smaller than `min_area`.
fn remove_small_components(mask: &GrayImage, min_area: u32) -> GrayImage {
    let labels = connected_components(mask, Connectivity::Eight, image::Luma([0u8]));

    let mut areas: HashMap<u32, u32> = HashMap::new();
    for label in labels.pixels().map(|p| p.0[0]).filter(|&l| l != 0) {
        *areas.entry(label).or_insert(0) += 1;
    }

    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let label = labels.get_pixel(x, y).0[0];
        let keep = label != 0 && areas.get(&label).copied().unwrap_or(0) >= min_area;
        image::Luma([if keep { 255 } else { 0 }])
    })
}

/// Force a `width`-pixel frame around the mask to background.
fn clear_border(mask: &mut GrayImage, width: u32) {
    let (w, h) = mask.dimensions();
    for y in 0..h {
        for x in 0..w {
            if x < width || y < width || x >= w.saturating_sub(width) || y >= h.saturating_sub(width)
            {
                mask.put_pixel(x, y, image::Luma([0]));
            }
        }
    }
}
