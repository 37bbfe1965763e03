//! aurum-export: external tool layer.
//!
//! Drives the contour tracer on the prepared bi-level raster and
//! converts the resulting SVG outline into optional PNG/PDF artifacts
//! through prioritized renderer fallback chains.
//!
//! Tool contracts are capability-based: any conforming binary on
//! `PATH` satisfies them. The tracer is a hard requirement; renderers
//! degrade gracefully: a missing or failing renderer shrinks the
//! output set but never aborts the job.

pub mod process;
pub mod render;
pub mod trace;

pub use render::{
    RenderFailure, RenderOptions, Renderer, default_renderers, export_pdf, export_pdf_with,
    export_png, export_png_with,
};
pub use trace::{TRACER_BIN, TraceEngine};

/// Errors from the trace engine. Renderer failures are not errors at
/// this level; they degrade inside the fallback chain.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The tracer binary is not installed; checked before any image
    /// work so the job fails fast.
    #[error("tracer '{TRACER_BIN}' not found on PATH; install it to vectorize images")]
    TracerUnavailable,

    /// The tracer ran but exited non-zero. Tracing is deterministic
    /// for identical input, so this is not retried.
    #[error("tracer failed: {reason}")]
    TraceFailed {
        /// Combined stdout/stderr of the failed run.
        reason: String,
    },

    /// Staging the raster or collecting tool output failed.
    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracer_unavailable_names_the_binary() {
        let err = ExportError::TracerUnavailable;
        assert!(err.to_string().contains("potrace"));
    }

    #[test]
    fn trace_failed_carries_diagnostic() {
        let err = ExportError::TraceFailed {
            reason: "bad bitmap header".to_owned(),
        };
        assert!(err.to_string().contains("bad bitmap header"));
    }
}
