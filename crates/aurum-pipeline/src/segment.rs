//! Foreground/background segmentation.
//!
//! Classifies every pixel of the decoded source image as foreground
//! (the logo) or background, producing a binary mask where 255 =
//! foreground. Two policies:
//!
//! - **Alpha**: if the image carries any transparency, a pixel is
//!   foreground iff its alpha exceeds a low threshold. This is the
//!   common case for pre-cut logos.
//! - **Color clustering**: if alpha is fully opaque everywhere, pixel
//!   colors are partitioned into two clusters via k-means; the larger
//!   cluster is assumed background.
//!
//! A uniform opaque image degenerates to a single-cluster mask; that is
//! accepted behavior, not an error.

use image::{GrayImage, RgbaImage};

use crate::kmeans;
use crate::progress::ProgressSink;

/// Alpha values above this count as foreground on the alpha path.
pub const ALPHA_THRESHOLD: u8 = 10;

/// Which segmentation policy was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationMethod {
    /// Transparency information was present: alpha > threshold.
    Alpha,
    /// Fully opaque image: two-cluster color partition.
    ColorClustering,
}

/// Segment the source image into a foreground mask (255 = foreground).
///
/// The output mask has the same dimensions as the input and values
/// strictly in `{0, 255}`.
#[must_use = "returns the foreground mask"]
pub fn segment(image: &RgbaImage, sink: &dyn ProgressSink) -> (GrayImage, SegmentationMethod) {
    let fully_opaque = image.pixels().all(|p| p.0[3] == 255);

    if fully_opaque {
        sink.report(
            "No alpha information: clustering colors into two groups",
            None,
        );
        (cluster_mask(image), SegmentationMethod::ColorClustering)
    } else {
        sink.report("Alpha channel present: thresholding transparency", None);
        (alpha_mask(image), SegmentationMethod::Alpha)
    }
}

/// Alpha path: any pixel with alpha above [`ALPHA_THRESHOLD`] is
/// foreground.
fn alpha_mask(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let alpha = image.get_pixel(x, y).0[3];
        image::Luma([if alpha > ALPHA_THRESHOLD { 255 } else { 0 }])
    })
}

/// Opaque path: two-cluster k-means over RGB; the smaller cluster is
/// taken as foreground.
fn cluster_mask(image: &RgbaImage) -> GrayImage {
    let colors: Vec<[f32; 3]> = image
        .pixels()
        .map(|p| [f32::from(p.0[0]), f32::from(p.0[1]), f32::from(p.0[2])])
        .collect();

    let partition = kmeans::partition_two(&colors, &mut rand::rng());
    let background = partition.larger_cluster();

    let width = image.width();
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let index = y as usize * width as usize + x as usize;
        let cluster = partition.assignments[index];
        image::Luma([if cluster == background { 0 } else { 255 }])
    })
}
