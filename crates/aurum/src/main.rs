//! Command-line front end.
//!
//! Reads a raster logo, runs the vectorization job on a background
//! thread, and mirrors its progress on a terminal bar by polling the
//! shared job state. Artifact paths are printed as plain lines or as a
//! JSON object with `--json`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use aurum_pipeline::{DEFAULT_FILL_COLOR, QualityTier};
use aurum_worker::{JobRegistry, JobRequest};

/// Convert a raster logo into a vector outline with optional PNG and
/// PDF renders.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input image path (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Directory receiving the SVG/PNG/PDF artifacts.
    #[arg(short, long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Quality tier trading speed for curve fidelity.
    #[arg(long, value_enum, default_value_t = Quality::Print)]
    quality: Quality,

    /// Pixel width for the PNG render; overrides --dpi when set.
    #[arg(long, value_name = "PX")]
    width_px: Option<u32>,

    /// Resolution for the PNG render when no pixel width is given.
    #[arg(long, default_value_t = 600)]
    dpi: u32,

    /// Fill color applied to the traced outline.
    #[arg(long, default_value = DEFAULT_FILL_COLOR)]
    fill: String,

    /// Print artifact paths as a JSON object instead of plain lines.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// CLI-facing quality names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Quality {
    /// Quick preview-grade trace.
    Fast,
    /// Balanced default for print use.
    Print,
    /// Slowest, highest-fidelity curves.
    Ultra,
}

impl From<Quality> for QualityTier {
    fn from(q: Quality) -> Self {
        match q {
            Quality::Fast => Self::Fast,
            Quality::Print => Self::Print,
            Quality::Ultra => Self::Ultra,
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let image_bytes = match std::fs::read(&args.input) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("cannot read {}: {err}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let stem = args
        .input
        .file_stem()
        .map_or_else(|| "logo".to_owned(), |s| s.to_string_lossy().into_owned());

    let request = JobRequest {
        image_bytes,
        stem,
        quality: args.quality.into(),
        dpi: args.dpi,
        width_px: args.width_px,
        fill_color: args.fill.clone(),
        output_dir: args.output_dir.clone(),
    };

    let registry = JobRegistry::new();
    let (id, progress) = registry.create();
    tracing::info!(%id, input = %args.input.display(), "job submitted");

    let handle = aurum_worker::spawn(request, progress);

    // Mirror the job state onto the bar until the job thread reports a
    // terminal state.
    let bar = progress_bar();
    loop {
        let Some(state) = registry.get(id).map(|p| p.snapshot()) else {
            break;
        };
        bar.set_position(u64::from(state.percent));
        bar.set_message(state.status.clone());
        if state.done {
            break;
        }
        std::thread::sleep(Duration::from_millis(200));
    }

    let outcome = match handle.join() {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            bar.abandon_with_message(err.to_string());
            eprintln!("error: {err}");
            registry.remove(id);
            return ExitCode::FAILURE;
        }
        Err(_) => {
            bar.abandon_with_message("job thread panicked");
            eprintln!("error: job thread panicked");
            registry.remove(id);
            return ExitCode::FAILURE;
        }
    };
    bar.finish_with_message("Done");
    registry.remove(id);

    if args.json {
        let map: serde_json::Map<String, serde_json::Value> = outcome
            .artifacts
            .iter()
            .map(|(kind, path)| {
                (
                    kind.key().to_owned(),
                    serde_json::Value::String(path.display().to_string()),
                )
            })
            .collect();
        println!("{}", serde_json::Value::Object(map));
    } else {
        for path in outcome.artifacts.values() {
            println!("{}", path.display());
        }
    }

    // Missing optional renders are a degradation, not a failure.
    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let args = Args::try_parse_from(["aurum", "logo.png"]).unwrap();
        assert_eq!(args.output_dir, PathBuf::from("outputs"));
        assert_eq!(args.quality, Quality::Print);
        assert_eq!(args.dpi, 600);
        assert_eq!(args.fill, DEFAULT_FILL_COLOR);
        assert!(!args.json);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn quality_names_map_to_tiers() {
        for (name, tier) in [
            ("fast", QualityTier::Fast),
            ("print", QualityTier::Print),
            ("ultra", QualityTier::Ultra),
        ] {
            let args = Args::try_parse_from(["aurum", "logo.png", "--quality", name]).unwrap();
            assert_eq!(QualityTier::from(args.quality), tier);
        }
    }

    #[test]
    fn width_overrides_are_optional() {
        let args = Args::try_parse_from(["aurum", "logo.png", "--width-px", "1200"]).unwrap();
        assert_eq!(args.width_px, Some(1200));
    }

    #[test]
    fn missing_input_is_rejected() {
        assert!(Args::try_parse_from(["aurum"]).is_err());
    }

    #[test]
    fn verbosity_counts() {
        let args = Args::try_parse_from(["aurum", "logo.png", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }
}
