//! aurum-worker: job orchestration.
//!
//! Runs the full pipeline for one submitted job (raster preparation,
//! tracing, and the export fallback chains), reporting through a
//! per-job [`JobProgress`]. Each job executes on its own background
//! thread; observers poll snapshots through the [`JobRegistry`].
//!
//! Fatal errors (missing tracer, trace failure) stop the pipeline and
//! leave a terminal failure status with a diagnostic in the log.
//! Export failures only shrink the artifact set.

pub mod progress;
pub mod registry;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use aurum_export::{
    ExportError, RenderOptions, Renderer, TraceEngine, default_renderers, export_pdf_with,
    export_png_with,
};
use aurum_pipeline::{DEFAULT_FILL_COLOR, PipelineError, ProgressSink, QualityTier};

pub use progress::{ArtifactKind, JobProgress, ProgressState};
pub use registry::{JobId, JobRegistry};

/// Everything needed to run one vectorization job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Raw bytes of the source image (PNG, JPEG, BMP, WebP).
    pub image_bytes: Vec<u8>,
    /// Output filename stem; artifacts become `<stem>.svg` etc.
    pub stem: String,
    /// Quality tier selecting the trace parameter bundle.
    pub quality: QualityTier,
    /// DPI for the PNG preview when no pixel width is given.
    pub dpi: u32,
    /// Explicit PNG pixel width; preferred over DPI when present.
    pub width_px: Option<u32>,
    /// Fill color for the traced outline.
    pub fill_color: String,
    /// Directory receiving the artifacts.
    pub output_dir: PathBuf,
}

impl JobRequest {
    /// A request with the default quality/fill/DPI bundle.
    #[must_use]
    pub fn new(image_bytes: Vec<u8>, stem: &str, output_dir: PathBuf) -> Self {
        Self {
            image_bytes,
            stem: stem.to_owned(),
            quality: QualityTier::default(),
            dpi: 600,
            width_px: None,
            fill_color: DEFAULT_FILL_COLOR.to_owned(),
            output_dir,
        }
    }
}

/// Artifacts a finished job produced, keyed by kind.
///
/// The outline is always present; the raster preview and print
/// document appear only when a renderer in their chain succeeded.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Produced artifact paths.
    pub artifacts: BTreeMap<ArtifactKind, PathBuf>,
}

/// Fatal job errors. Export degradation is not represented here.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The tracer capability is absent; nothing was attempted.
    #[error("required tracer is not installed")]
    MissingCapability,

    /// Raster preparation failed (decode or config problem).
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The trace engine failed; intermediates were discarded.
    #[error(transparent)]
    Trace(#[from] ExportError),

    /// Output directory or artifact I/O failed.
    #[error("job I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run a job to completion on the calling thread.
///
/// On a fatal error the progress state is marked failed with the
/// diagnostic in the log before the error is returned.
///
/// # Errors
///
/// Returns [`JobError::MissingCapability`] when the tracer is absent,
/// [`JobError::Pipeline`] / [`JobError::Trace`] for fatal stage
/// failures, and [`JobError::Io`] when the output directory cannot be
/// created.
pub fn run(request: &JobRequest, progress: &JobProgress) -> Result<JobOutcome, JobError> {
    let result = execute(request, progress);
    match &result {
        Ok(outcome) => {
            for (kind, path) in &outcome.artifacts {
                progress.record_artifact(*kind, path.clone());
            }
            progress.report("Done", Some(100));
            progress.mark_done();
        }
        Err(err) => progress.mark_failed(&format!("Job failed: {err}")),
    }
    result
}

/// Spawn a job on its own background thread.
///
/// The caller keeps the [`JobProgress`] (usually via a
/// [`JobRegistry`]) and polls snapshots; the handle yields the final
/// outcome.
#[must_use]
pub fn spawn(request: JobRequest, progress: JobProgress) -> JoinHandle<Result<JobOutcome, JobError>> {
    thread::spawn(move || run(&request, &progress))
}

fn execute(request: &JobRequest, progress: &JobProgress) -> Result<JobOutcome, JobError> {
    execute_with(
        request,
        progress,
        &TraceEngine::default(),
        &default_renderers(),
    )
}

fn execute_with(
    request: &JobRequest,
    progress: &JobProgress,
    engine: &TraceEngine,
    renderers: &[&dyn Renderer],
) -> Result<JobOutcome, JobError> {
    // Fail fast before any image work if the tracer is missing.
    if !engine.available() {
        return Err(JobError::MissingCapability);
    }

    progress.report("File received, preprocessing", Some(5));
    std::fs::create_dir_all(&request.output_dir)?;

    let params = request.quality.trace_params();
    let prepared = aurum_pipeline::prepare(&request.image_bytes, request.quality, progress)?;

    let mut artifacts = BTreeMap::new();

    // Vector outline: the canonical artifact everything else derives
    // from. A trace failure is fatal.
    let svg_path = request.output_dir.join(format!("{}.svg", request.stem));
    engine.trace(
        &prepared.pbm,
        &svg_path,
        &request.fill_color,
        &params,
        progress,
    )?;
    artifacts.insert(ArtifactKind::Outline, svg_path.clone());

    // Raster preview: optional, chain degradation is not an error.
    progress.report("Creating PNG preview", Some(80));
    let png_path = request.output_dir.join(format!("{}.png", request.stem));
    let options = RenderOptions {
        dpi: request.dpi,
        width_px: request.width_px,
        height_px: None,
    };
    if export_png_with(renderers, &svg_path, &png_path, &options, progress) {
        artifacts.insert(ArtifactKind::RasterPreview, png_path);
    }

    // Print document: optional as well.
    progress.report("Creating PDF", Some(94));
    let pdf_path = request.output_dir.join(format!("{}.pdf", request.stem));
    if export_pdf_with(renderers, &svg_path, &pdf_path, progress) {
        artifacts.insert(ArtifactKind::PrintDocument, pdf_path);
    }

    Ok(JobOutcome { artifacts })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png_fixture() -> Vec<u8> {
        let img = image::RgbaImage::from_fn(40, 40, |x, _| {
            image::Rgba([10, 10, 10, if x < 20 { 255 } else { 0 }])
        });
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn request_defaults_match_presets() {
        let request = JobRequest::new(Vec::new(), "logo", PathBuf::from("out"));
        assert_eq!(request.quality, QualityTier::Print);
        assert_eq!(request.dpi, 600);
        assert_eq!(request.fill_color, DEFAULT_FILL_COLOR);
        assert!(request.width_px.is_none());
    }

    #[test]
    fn failed_job_marks_progress_failed() {
        // Empty image bytes are rejected by the pipeline; the progress
        // state must carry a terminal diagnostic. Skipped when no
        // tracer is installed, since the capability check runs first.
        let engine = TraceEngine::default();
        if !engine.available() {
            return;
        }

        let request = JobRequest::new(Vec::new(), "empty", std::env::temp_dir());
        let progress = JobProgress::new();
        let result = run(&request, &progress);
        assert!(matches!(result, Err(JobError::Pipeline(_))));

        let state = progress.snapshot();
        assert!(state.done);
        assert!(state.failed);
        assert!(state.status.contains("Job failed"));
    }

    #[test]
    fn spawned_job_reports_through_registry() {
        let engine = TraceEngine::default();
        if !engine.available() {
            // Without the tracer the job fails fast; verify that path
            // end to end instead.
            let registry = JobRegistry::new();
            let (id, progress) = registry.create();
            let request = JobRequest::new(png_fixture(), "logo", std::env::temp_dir());
            let handle = spawn(request, progress);
            let result = handle.join().unwrap();
            assert!(matches!(result, Err(JobError::MissingCapability)));
            let state = registry.get(id).map(|p| p.snapshot());
            assert_eq!(state.map(|s| s.failed), Some(true));
            return;
        }

        let registry = JobRegistry::new();
        let (id, progress) = registry.create();
        let dir = std::env::temp_dir().join("aurum-worker-test");
        let request = JobRequest::new(png_fixture(), "worker-test-logo", dir);
        let handle = spawn(request, progress);
        let outcome = handle.join().unwrap();

        let state = registry.get(id).map(|p| p.snapshot());
        match outcome {
            Ok(outcome) => {
                // Outline always present on success; PNG/PDF optional.
                assert!(outcome.artifacts.contains_key(&ArtifactKind::Outline));
                assert_eq!(state.map(|s| s.percent), Some(100));
            }
            Err(_) => {
                // Tracer present but failed for environmental reasons;
                // the failure must still be terminal in the state.
                assert_eq!(state.map(|s| s.failed), Some(true));
            }
        }
    }

    #[test]
    fn job_succeeds_without_optional_artifacts_when_no_renderer_is_available() {
        use std::path::Path;

        use aurum_export::RenderFailure;

        struct NoTool;
        impl Renderer for NoTool {
            fn name(&self) -> &'static str {
                "no-tool"
            }

            fn available(&self) -> bool {
                false
            }

            fn render_png(
                &self,
                _svg: &Path,
                _out: &Path,
                _options: &RenderOptions,
                _sink: &dyn ProgressSink,
            ) -> Result<(), RenderFailure> {
                Err(RenderFailure {
                    reason: "not installed".to_owned(),
                })
            }

            fn render_pdf(
                &self,
                _svg: &Path,
                _out: &Path,
                _sink: &dyn ProgressSink,
            ) -> Result<(), RenderFailure> {
                Err(RenderFailure {
                    reason: "not installed".to_owned(),
                })
            }
        }

        let engine = TraceEngine::default();
        if !engine.available() {
            return;
        }

        let dir = std::env::temp_dir().join("aurum-worker-no-render");
        let request = JobRequest::new(png_fixture(), "no-render-logo", dir);
        let progress = JobProgress::new();
        let outcome = execute_with(&request, &progress, &engine, &[&NoTool]).unwrap();

        // The outline is produced; the degraded exports leave their
        // keys out without failing the job.
        assert!(outcome.artifacts.contains_key(&ArtifactKind::Outline));
        assert!(!outcome.artifacts.contains_key(&ArtifactKind::RasterPreview));
        assert!(!outcome.artifacts.contains_key(&ArtifactKind::PrintDocument));
        assert!(!progress.snapshot().failed);
    }

    #[test]
    fn missing_tracer_fails_before_image_work() {
        // The capability check happens before decode, so even invalid
        // image bytes report MissingCapability when potrace is absent.
        let engine = TraceEngine::default();
        if engine.available() {
            return;
        }
        let request = JobRequest::new(vec![0xFF], "x", std::env::temp_dir());
        let progress = JobProgress::new();
        let result = run(&request, &progress);
        assert!(matches!(result, Err(JobError::MissingCapability)));
    }
}
