//! aurum-pipeline: raster preparation core (sans-IO).
//!
//! Converts a raster logo into a clean bi-level raster ready for
//! contour tracing:
//! segmentation -> mask cleanup -> nearest-neighbor upsample ->
//! polarity inversion -> raw PBM encoding.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Tracer and renderer
//! invocation lives in `aurum-export`; job orchestration in
//! `aurum-worker`.

pub mod cleanup;
pub mod kmeans;
pub mod pbm;
pub mod progress;
pub mod segment;
pub mod types;
pub mod upsample;

pub use progress::{NullSink, ProgressSink};
pub use segment::SegmentationMethod;
pub use types::{
    DEFAULT_FILL_COLOR, Dimensions, GrayImage, PipelineError, QualityTier, RgbaImage, TraceParams,
    TurnPolicy,
};

/// Output of the raster preparation pipeline.
///
/// The PBM bytes are what the trace engine consumes; the cleaned mask
/// and dimensions are kept for diagnostics and tests.
#[derive(Debug, Clone)]
pub struct PreparedRaster {
    /// Raw P4 PBM, upsampled and inverted (0 = black = foreground).
    pub pbm: Vec<u8>,

    /// The cleaned foreground mask at source resolution
    /// (255 = foreground).
    pub mask: GrayImage,

    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,

    /// Dimensions of the upsampled bi-level raster.
    pub scaled: Dimensions,
}

impl PreparedRaster {
    /// Fraction of mask pixels that are foreground, in `[0, 1]`.
    #[must_use]
    pub fn coverage(&self) -> f64 {
        let total = self.mask.as_raw().len();
        if total == 0 {
            return 0.0;
        }
        let foreground = self.mask.pixels().filter(|p| p.0[0] == 255).count();
        #[allow(clippy::cast_precision_loss)]
        {
            foreground as f64 / total as f64
        }
    }
}

/// Run raster preparation: decode, segment, clean, upsample, encode.
///
/// Progress lands in the 12-41 band; the caller owns the bands before
/// and after.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn prepare(
    image_bytes: &[u8],
    tier: QualityTier,
    sink: &dyn ProgressSink,
) -> Result<PreparedRaster, PipelineError> {
    let params = tier.trace_params();

    // 1. Decode to RGBA.
    sink.report("Loading image", Some(12));
    if image_bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let rgba = image::load_from_memory(image_bytes)?.to_rgba8();
    let dimensions = Dimensions {
        width: rgba.width(),
        height: rgba.height(),
    };

    // 2. Segmentation.
    sink.report("Generating foreground mask", Some(26));
    let (raw_mask, _method) = segment::segment(&rgba, sink);

    // 3. Cleanup: denoise, drop small components, close, clear border.
    sink.report("Denoising and removing small components", None);
    let mask = cleanup::clean_mask(&raw_mask);

    // 4. Upsample, invert, encode as raw PBM.
    sink.report("Preparing bi-level raster", Some(40));
    let upsampled = upsample::upsample_nearest(&mask, params.scale_up)?;
    let inverted = upsample::invert(&upsampled);
    let scaled = Dimensions {
        width: inverted.width(),
        height: inverted.height(),
    };
    let pbm = pbm::encode_pbm(&inverted);

    let prepared = PreparedRaster {
        pbm,
        mask,
        dimensions,
        scaled,
    };
    sink.report(
        &format!(
            "Mask coverage: {:.1}%, raster {}x{}px",
            prepared.coverage() * 100.0,
            scaled.width,
            scaled.height,
        ),
        Some(41),
    );

    Ok(prepared)
}
