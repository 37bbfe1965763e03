//! Trace engine: drive the external contour tracer.
//!
//! The bi-level PBM raster is written to a scoped temporary file and
//! handed to `potrace`, which produces the SVG outline with a single
//! solid fill. The child is polled while it runs so observers see
//! continuous feedback during otherwise-opaque external work.
//!
//! A non-zero exit is fatal for the job and is not retried: tracing is
//! deterministic given identical input, so a retry would reproduce the
//! same failure. The temporary raster is deleted on every exit path
//! (the tempfile guard drops on success, failure, and early return).

use std::io::Write;
use std::path::Path;
use std::process::Command;

use aurum_pipeline::{ProgressSink, TraceParams};

use crate::ExportError;
use crate::process::{run_polled, tool_available};

/// Default tracer binary name.
pub const TRACER_BIN: &str = "potrace";

/// Handle to the external tracer capability.
#[derive(Debug, Clone)]
pub struct TraceEngine {
    program: String,
}

impl Default for TraceEngine {
    fn default() -> Self {
        Self::with_program(TRACER_BIN)
    }
}

impl TraceEngine {
    /// Use a specific tracer binary (tests point this at a bogus name).
    #[must_use]
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_owned(),
        }
    }

    /// Whether the tracer binary is present on `PATH`.
    #[must_use]
    pub fn available(&self) -> bool {
        tool_available(&self.program)
    }

    /// Trace a PBM raster into an SVG outline at `out_svg`.
    ///
    /// A zero-coverage raster is valid input: the tracer emits a
    /// syntactically valid (empty) SVG document.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::TracerUnavailable`] when the binary is
    /// missing, [`ExportError::TraceFailed`] on a non-zero exit with
    /// the combined stdout/stderr as the diagnostic, and
    /// [`ExportError::Io`] if the raster cannot be staged.
    pub fn trace(
        &self,
        pbm: &[u8],
        out_svg: &Path,
        fill_color: &str,
        params: &TraceParams,
        sink: &dyn ProgressSink,
    ) -> Result<(), ExportError> {
        if !self.available() {
            return Err(ExportError::TracerUnavailable);
        }

        // Stage the raster; the guard removes it on all exit paths.
        let mut raster = tempfile::Builder::new().suffix(".pbm").tempfile()?;
        raster.write_all(pbm)?;
        raster.flush()?;

        sink.report("Tracing outline", Some(65));
        let mut command = Command::new(&self.program);
        command
            .arg(raster.path())
            .args(["-s", "-o"])
            .arg(out_svg)
            .args(["-C", fill_color])
            .args(["-a", &params.alphamax.to_string()])
            .args(["-O", &params.opttolerance.to_string()])
            .args(["-t", &params.turdsize.to_string()])
            .arg("--longcurve")
            .args(["-z", &params.turn_policy.to_string()]);

        let result = run_polled(&mut command, sink, "Building Bézier curves", 65, 74)?;
        if !result.success {
            return Err(ExportError::TraceFailed {
                reason: result.output,
            });
        }

        sink.report("SVG outline ready", Some(75));
        Ok(())
    }
}
