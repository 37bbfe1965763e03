//! Progress reporting port.
//!
//! Every pipeline stage reports through a shared [`ProgressSink`]:
//! a free-form status message plus an optional percent. The sink is a
//! port trait so the core stays decoupled from whatever consumes the
//! updates (a job progress record, a CLI progress bar, a test buffer).
//!
//! Stages own disjoint percent bands by convention: 0-12 load, 12-41
//! segmentation/mask/raster, 41-75 trace, 75-98 export, 100 terminal.
//! Enforcement of clamping and monotonicity lives in the consumer.

/// Port for receiving progress updates from pipeline stages.
pub trait ProgressSink: Send + Sync {
    /// Report a status message, optionally advancing the percent.
    ///
    /// `percent` is a job-wide value in `[0, 100]`; consumers clamp
    /// out-of-range values and must never move percent backwards.
    fn report(&self, message: &str, percent: Option<u8>);
}

/// A sink that discards all updates.
///
/// Useful for tests and library callers that do not track progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _message: &str, _percent: Option<u8>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_accepts_updates() {
        let sink = NullSink;
        sink.report("anything", Some(50));
        sink.report("no percent", None);
    }

    #[test]
    fn sink_is_object_safe() {
        let sink: &dyn ProgressSink = &NullSink;
        sink.report("dynamic dispatch", Some(1));
    }
}
