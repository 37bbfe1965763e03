//! Capability probing and polled child-process execution.
//!
//! External tools are opaque while they run, so long-running children
//! are polled at a fixed interval and each poll emits one progress
//! update in a bounded percent band: monotonically non-decreasing and
//! capped below 100 until the process genuinely exits.
//!
//! These are blocking calls on the pipeline's own thread. There is no
//! timeout and no cancellation: a hung tool hangs the job.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use aurum_pipeline::ProgressSink;

/// Fixed poll interval for running children.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Whether an external tool is present on `PATH`.
#[must_use]
pub fn tool_available(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Exit status plus combined stdout/stderr text of a finished child.
#[derive(Debug)]
pub struct ProcessOutput {
    /// Whether the child exited with status zero.
    pub success: bool,
    /// Combined stdout and stderr, used as the diagnostic on failure.
    pub output: String,
}

/// Run a child to completion, polling at [`POLL_INTERVAL`] and
/// reporting `message` with a percent walking from `floor` up to at
/// most `cap` (one step per poll).
///
/// # Errors
///
/// Returns an error only if the child cannot be spawned or waited on;
/// a non-zero exit is reported through [`ProcessOutput::success`].
pub fn run_polled(
    command: &mut Command,
    sink: &dyn ProgressSink,
    message: &str,
    floor: u8,
    cap: u8,
) -> std::io::Result<ProcessOutput> {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Drain both pipes while polling; a child writing more than the
    // pipe buffer holds would otherwise block before it can exit.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let mut ticks = 0u8;
    loop {
        if child.try_wait()?.is_some() {
            break;
        }
        thread::sleep(POLL_INTERVAL);
        ticks = ticks.saturating_add(1);
        sink.report(message, Some(cap.min(floor.saturating_add(ticks))));
    }

    collect_output(child, stdout, stderr)
}

/// Run a child to completion without polling; for short-lived tools.
///
/// # Errors
///
/// Returns an error only if the child cannot be spawned or waited on.
pub fn run_captured(command: &mut Command) -> std::io::Result<ProcessOutput> {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    collect_output(child, stdout, stderr)
}

/// Read a pipe to the end on a background thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut text);
        }
        text
    })
}

/// Wait for exit and combine the drained pipes into one diagnostic.
fn collect_output(
    mut child: std::process::Child,
    stdout: thread::JoinHandle<String>,
    stderr: thread::JoinHandle<String>,
) -> std::io::Result<ProcessOutput> {
    let status = child.wait()?;
    let mut output = stdout.join().unwrap_or_default();
    output.push_str(&stderr.join().unwrap_or_default());

    Ok(ProcessOutput {
        success: status.success(),
        output,
    })
}
