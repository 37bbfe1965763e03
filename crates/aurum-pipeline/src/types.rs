//! Shared types for the aurum raster preparation pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference masks
/// without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference the
/// decoded source image without depending on `image` directly.
pub use image::RgbaImage;

/// Default fill color applied to traced outlines: a warm gold tone.
pub const DEFAULT_FILL_COLOR: &str = "#C59A52";

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Turn policy for resolving ambiguous pixel corners during tracing.
///
/// Matches the tracer's `-z` flag vocabulary. `Minority` prefers the
/// neighbor that produces the smaller curvature change and is the
/// default for all quality tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPolicy {
    /// Always connect black pixels.
    Black,
    /// Always connect white pixels.
    White,
    /// Always turn left.
    Left,
    /// Always turn right.
    Right,
    /// Connect the color occurring least frequently in the neighborhood.
    #[default]
    Minority,
    /// Connect the color occurring most frequently in the neighborhood.
    Majority,
}

impl fmt::Display for TurnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Black => f.write_str("black"),
            Self::White => f.write_str("white"),
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
            Self::Minority => f.write_str("minority"),
            Self::Majority => f.write_str("majority"),
        }
    }
}

/// Fixed parameter bundle handed to the trace engine.
///
/// `scale_up` governs raster preparation (integer nearest-neighbor
/// upsample factor); the remaining fields map 1:1 onto tracer flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceParams {
    /// Integer upsample factor applied to the mask before encoding.
    pub scale_up: u32,
    /// Corner-smoothness threshold (tracer `-a`).
    pub alphamax: f64,
    /// Curve-optimization tolerance (tracer `-O`).
    pub opttolerance: f64,
    /// Minimum feature size in pixels; smaller speckles are dropped
    /// (tracer `-t`).
    pub turdsize: u32,
    /// Ambiguous-corner resolution policy (tracer `-z`).
    pub turn_policy: TurnPolicy,
}

/// Named bundle of tracing parameters selected by the caller instead
/// of each knob individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Quick preview quality: lower upsample, looser tolerances.
    Fast,
    /// Print quality (default): the balanced bundle.
    #[default]
    Print,
    /// Maximum detail: highest upsample, tightest tolerances.
    Ultra,
}

impl QualityTier {
    /// The fixed parameter bundle for this tier.
    #[must_use]
    pub fn trace_params(self) -> TraceParams {
        let (scale_up, alphamax, opttolerance, turdsize) = match self {
            Self::Fast => (6, 1.25, 0.18, 2),
            Self::Print => (8, 1.35, 0.16, 1),
            Self::Ultra => (12, 1.38, 0.15, 1),
        };
        TraceParams {
            scale_up,
            alphamax,
            opttolerance,
            turdsize,
            turn_policy: TurnPolicy::Minority,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => f.write_str("fast"),
            Self::Print => f.write_str("print"),
            Self::Ultra => f.write_str("ultra"),
        }
    }
}

/// Errors that can occur during raster preparation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The upsample factor must be at least 1.
    #[error("invalid upsample factor: {0} (must be >= 1)")]
    InvalidScale(u32),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_tier_is_print() {
        assert_eq!(QualityTier::default(), QualityTier::Print);
    }

    #[test]
    fn tier_bundles_match_presets() {
        let fast = QualityTier::Fast.trace_params();
        assert_eq!(fast.scale_up, 6);
        assert!((fast.alphamax - 1.25).abs() < f64::EPSILON);
        assert!((fast.opttolerance - 0.18).abs() < f64::EPSILON);
        assert_eq!(fast.turdsize, 2);

        let print = QualityTier::Print.trace_params();
        assert_eq!(print.scale_up, 8);
        assert!((print.alphamax - 1.35).abs() < f64::EPSILON);
        assert!((print.opttolerance - 0.16).abs() < f64::EPSILON);
        assert_eq!(print.turdsize, 1);

        let ultra = QualityTier::Ultra.trace_params();
        assert_eq!(ultra.scale_up, 12);
        assert!((ultra.alphamax - 1.38).abs() < f64::EPSILON);
        assert!((ultra.opttolerance - 0.15).abs() < f64::EPSILON);
        assert_eq!(ultra.turdsize, 1);
    }

    #[test]
    fn all_tiers_use_minority_turn_policy() {
        for tier in [QualityTier::Fast, QualityTier::Print, QualityTier::Ultra] {
            assert_eq!(tier.trace_params().turn_policy, TurnPolicy::Minority);
        }
    }

    #[test]
    fn turn_policy_display_matches_tracer_flags() {
        assert_eq!(TurnPolicy::Minority.to_string(), "minority");
        assert_eq!(TurnPolicy::Majority.to_string(), "majority");
        assert_eq!(TurnPolicy::Black.to_string(), "black");
        assert_eq!(TurnPolicy::White.to_string(), "white");
        assert_eq!(TurnPolicy::Left.to_string(), "left");
        assert_eq!(TurnPolicy::Right.to_string(), "right");
    }

    #[test]
    fn default_fill_is_warm_gold() {
        assert_eq!(DEFAULT_FILL_COLOR, "#C59A52");
    }

    #[test]
    fn dimensions_equality() {
        assert_eq!(
            Dimensions {
                width: 100,
                height: 200
            },
            Dimensions {
                width: 100,
                height: 200
            },
        );
        assert_ne!(
            Dimensions {
                width: 100,
                height: 200
            },
            Dimensions {
                width: 100,
                height: 201
            },
        );
    }

    #[test]
    fn error_empty_input_display() {
        let err = PipelineError::EmptyInput;
        assert_eq!(err.to_string(), "input image data is empty");
    }

    #[test]
    fn error_invalid_scale_display() {
        let err = PipelineError::InvalidScale(0);
        assert_eq!(
            err.to_string(),
            "invalid upsample factor: 0 (must be >= 1)"
        );
    }

    #[test]
    fn quality_tier_serde_round_trip() {
        for tier in [QualityTier::Fast, QualityTier::Print, QualityTier::Ultra] {
            let json = serde_json::to_string(&tier).unwrap();
            let back: QualityTier = serde_json::from_str(&json).unwrap();
            assert_eq!(tier, back);
        }
    }
}
