//! Per-job progress state.
//!
//! One [`JobProgress`] exists per job. The job thread is the only
//! writer; observers take cloned snapshots at any time. The state sits
//! behind a mutex so reads are never torn (single-writer/multi-reader
//! contract).
//!
//! Percent is clamped to `[0, 100]` and is monotonic: a stage can
//! never move it below a value a later report already established.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use aurum_pipeline::ProgressSink;
use serde::{Deserialize, Serialize};

/// Kinds of artifacts a job can produce.
///
/// The outline is the canonical output; the preview and print document
/// are independently optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Scalable vector outline (SVG), always present on success.
    Outline,
    /// Raster preview (PNG), optional.
    RasterPreview,
    /// Print document (PDF), optional.
    PrintDocument,
}

impl ArtifactKind {
    /// Stable identifier used as the artifact map key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::RasterPreview => "raster-preview",
            Self::PrintDocument => "print-document",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Observable state of a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressState {
    /// Overall completion percent, 0-100, monotonically non-decreasing.
    pub percent: u8,
    /// Latest status message.
    pub status: String,
    /// Ordered log of every message reported so far.
    pub logs: Vec<String>,
    /// Whether the job has finished (successfully or not).
    pub done: bool,
    /// Whether the job finished with a fatal error.
    pub failed: bool,
    /// Artifacts produced so far, keyed by kind.
    pub artifacts: BTreeMap<ArtifactKind, PathBuf>,
}

/// Shared handle to a job's progress; cheap to clone.
///
/// The job thread writes through the [`ProgressSink`] impl and the
/// terminal-state methods; observers call [`JobProgress::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct JobProgress {
    inner: Arc<Mutex<ProgressState>>,
}

impl JobProgress {
    /// Fresh state for a new job.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone the current state for an observer.
    #[must_use]
    pub fn snapshot(&self) -> ProgressState {
        self.inner
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    /// Record a produced artifact.
    pub fn record_artifact(&self, kind: ArtifactKind, path: PathBuf) {
        if let Ok(mut state) = self.inner.lock() {
            state.artifacts.insert(kind, path);
        }
    }

    /// Mark the job finished successfully at 100 percent.
    pub fn mark_done(&self) {
        if let Ok(mut state) = self.inner.lock() {
            state.percent = 100;
            state.done = true;
        }
    }

    /// Mark the job failed, appending the diagnostic to the log.
    pub fn mark_failed(&self, diagnostic: &str) {
        if let Ok(mut state) = self.inner.lock() {
            state.status = diagnostic.to_owned();
            state.logs.push(diagnostic.to_owned());
            state.done = true;
            state.failed = true;
        }
        tracing::error!(diagnostic, "job failed");
    }
}

impl ProgressSink for JobProgress {
    fn report(&self, message: &str, percent: Option<u8>) {
        if let Ok(mut state) = self.inner.lock() {
            if let Some(p) = percent {
                // Clamp and never move backwards.
                state.percent = state.percent.max(p.min(100));
            }
            state.status = message.to_owned();
            state.logs.push(message.to_owned());
        }
        tracing::info!(percent, status = message, "progress");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_zeroed() {
        let progress = JobProgress::new();
        let state = progress.snapshot();
        assert_eq!(state.percent, 0);
        assert!(!state.done);
        assert!(!state.failed);
        assert!(state.logs.is_empty());
        assert!(state.artifacts.is_empty());
    }

    #[test]
    fn percent_clamps_to_100() {
        let progress = JobProgress::new();
        progress.report("overflow", Some(150));
        assert_eq!(progress.snapshot().percent, 100);
    }

    #[test]
    fn percent_never_decreases() {
        let progress = JobProgress::new();
        progress.report("trace", Some(70));
        progress.report("stale stage", Some(30));
        assert_eq!(progress.snapshot().percent, 70);
    }

    #[test]
    fn message_without_percent_keeps_percent() {
        let progress = JobProgress::new();
        progress.report("half", Some(50));
        progress.report("detail line", None);
        let state = progress.snapshot();
        assert_eq!(state.percent, 50);
        assert_eq!(state.status, "detail line");
    }

    #[test]
    fn log_is_ordered_and_status_is_latest() {
        let progress = JobProgress::new();
        progress.report("one", Some(10));
        progress.report("two", None);
        progress.report("three", Some(20));
        let state = progress.snapshot();
        assert_eq!(state.logs, vec!["one", "two", "three"]);
        assert_eq!(state.status, "three");
    }

    #[test]
    fn mark_done_sets_terminal_success() {
        let progress = JobProgress::new();
        progress.report("almost", Some(98));
        progress.mark_done();
        let state = progress.snapshot();
        assert_eq!(state.percent, 100);
        assert!(state.done);
        assert!(!state.failed);
    }

    #[test]
    fn mark_failed_records_diagnostic() {
        let progress = JobProgress::new();
        progress.mark_failed("tracer failed: bad header");
        let state = progress.snapshot();
        assert!(state.done);
        assert!(state.failed);
        assert_eq!(state.status, "tracer failed: bad header");
        assert!(state.logs.contains(&"tracer failed: bad header".to_owned()));
    }

    #[test]
    fn artifacts_accumulate_by_kind() {
        let progress = JobProgress::new();
        progress.record_artifact(ArtifactKind::Outline, PathBuf::from("logo.svg"));
        progress.record_artifact(ArtifactKind::RasterPreview, PathBuf::from("logo.png"));
        let state = progress.snapshot();
        assert_eq!(state.artifacts.len(), 2);
        assert_eq!(
            state.artifacts.get(&ArtifactKind::Outline),
            Some(&PathBuf::from("logo.svg"))
        );
    }

    #[test]
    fn artifact_keys_are_stable_identifiers() {
        assert_eq!(ArtifactKind::Outline.key(), "outline");
        assert_eq!(ArtifactKind::RasterPreview.key(), "raster-preview");
        assert_eq!(ArtifactKind::PrintDocument.key(), "print-document");
    }

    #[test]
    fn state_serializes_with_kebab_case_artifact_keys() {
        let progress = JobProgress::new();
        progress.record_artifact(ArtifactKind::PrintDocument, PathBuf::from("logo.pdf"));
        let json = serde_json::to_string(&progress.snapshot()).unwrap();
        assert!(json.contains("print-document"));
    }

    #[test]
    fn progress_event_carries_status_field() {
        use tracing_subscriber::fmt::MakeWriter;

        // The event's own message is "progress"; the report text must
        // land in a distinct `status` field.
        #[derive(Clone, Default)]
        struct Capture(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for Capture {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                if let Ok(mut inner) = self.0.lock() {
                    inner.extend_from_slice(buf);
                }
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        impl<'a> MakeWriter<'a> for Capture {
            type Writer = Self;

            fn make_writer(&'a self) -> Self::Writer {
                self.clone()
            }
        }

        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(capture.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            JobProgress::new().report("Tracing outline", Some(50));
        });

        let text = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("progress"));
        assert!(text.contains("status=\"Tracing outline\""));
        assert!(text.contains("percent=50"));
    }

    #[test]
    fn clones_share_state() {
        let progress = JobProgress::new();
        let writer = progress.clone();
        writer.report("shared", Some(42));
        assert_eq!(progress.snapshot().percent, 42);
    }
}
