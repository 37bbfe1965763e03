//! Renderer fallback chains for PNG and PDF export.
//!
//! Two independent export operations (raster preview and print
//! document) each walk a fixed priority list of renderer capabilities:
//! Inkscape first, then rsvg-convert, then an in-process renderer as
//! last resort. An unavailable capability is skipped; a failed one is
//! logged and the next is tried. Only when the whole chain is exhausted
//! does the export report `false`, and that is a soft failure: the job
//! still completes, just without that artifact.
//!
//! All renderers preserve the transparent background and crop output to
//! the drawn content. Sizing prefers an explicit pixel width (sharper)
//! and falls back to a DPI target.

use std::fs;
use std::path::Path;
use std::process::Command;

use aurum_pipeline::ProgressSink;

use crate::process::{run_captured, run_polled, tool_available};

/// Output sizing for the raster preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// DPI target, used only when no explicit pixel width is given.
    pub dpi: u32,
    /// Explicit pixel width target; preferred over DPI when present.
    pub width_px: Option<u32>,
    /// Explicit pixel height; only honored alongside `width_px`.
    pub height_px: Option<u32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            width_px: None,
            height_px: None,
        }
    }
}

/// A renderer attempt that did not produce output.
#[derive(Debug, thiserror::Error)]
#[error("{reason}")]
pub struct RenderFailure {
    /// Human-readable diagnostic (tool output or parse error).
    pub reason: String,
}

impl From<std::io::Error> for RenderFailure {
    fn from(err: std::io::Error) -> Self {
        Self {
            reason: err.to_string(),
        }
    }
}

/// A vector-to-raster / vector-to-print capability.
///
/// Implementations are interchangeable: the chains iterate a priority
/// list until one succeeds or the list is exhausted.
pub trait Renderer {
    /// Short tool name for logs.
    fn name(&self) -> &'static str;

    /// Whether the capability can be invoked right now.
    fn available(&self) -> bool;

    /// Render the SVG to a transparent-background PNG cropped to the
    /// drawn content.
    ///
    /// # Errors
    ///
    /// Returns [`RenderFailure`] when the tool exits non-zero or the
    /// document cannot be processed; the chain falls through to the
    /// next capability.
    fn render_png(
        &self,
        svg: &Path,
        out: &Path,
        options: &RenderOptions,
        sink: &dyn ProgressSink,
    ) -> Result<(), RenderFailure>;

    /// Render the SVG to a print-ready PDF cropped to the drawn
    /// content.
    ///
    /// # Errors
    ///
    /// Returns [`RenderFailure`] when the tool exits non-zero or the
    /// document cannot be processed.
    fn render_pdf(&self, svg: &Path, out: &Path, sink: &dyn ProgressSink)
    -> Result<(), RenderFailure>;
}

/// The fixed priority order: external tools first, in-process last.
#[must_use]
pub fn default_renderers() -> [&'static dyn Renderer; 3] {
    [&Inkscape, &RsvgConvert, &Builtin]
}

/// Export the SVG as a PNG preview through the default fallback chain.
///
/// Returns `true` if any capability produced the file. `false` is a
/// soft failure; the artifact is simply omitted.
#[must_use = "a false return means the artifact was not produced"]
pub fn export_png(
    svg: &Path,
    out: &Path,
    options: &RenderOptions,
    sink: &dyn ProgressSink,
) -> bool {
    export_png_with(&default_renderers(), svg, out, options, sink)
}

/// Export the SVG as a print PDF through the default fallback chain.
#[must_use = "a false return means the artifact was not produced"]
pub fn export_pdf(svg: &Path, out: &Path, sink: &dyn ProgressSink) -> bool {
    export_pdf_with(&default_renderers(), svg, out, sink)
}

/// Walk a caller-supplied PNG renderer chain.
#[must_use = "a false return means the artifact was not produced"]
pub fn export_png_with(
    renderers: &[&dyn Renderer],
    svg: &Path,
    out: &Path,
    options: &RenderOptions,
    sink: &dyn ProgressSink,
) -> bool {
    sink.report("PNG export starting", Some(82));
    for renderer in renderers {
        if !renderer.available() {
            sink.report(&format!("{}: not installed, skipping", renderer.name()), None);
            continue;
        }
        sink.report(&format!("Rendering PNG with {}", renderer.name()), Some(83));
        match renderer.render_png(svg, out, options, sink) {
            Ok(()) => {
                sink.report("Render complete, file written", Some(92));
                return true;
            }
            Err(failure) => {
                tracing::warn!(renderer = renderer.name(), %failure, "PNG render failed");
                sink.report(
                    &format!("PNG export with {} failed: {failure}", renderer.name()),
                    None,
                );
            }
        }
    }
    sink.report("No PNG renderer succeeded", Some(92));
    false
}

/// Walk a caller-supplied PDF renderer chain.
#[must_use = "a false return means the artifact was not produced"]
pub fn export_pdf_with(
    renderers: &[&dyn Renderer],
    svg: &Path,
    out: &Path,
    sink: &dyn ProgressSink,
) -> bool {
    sink.report("PDF export starting", Some(94));
    for renderer in renderers {
        if !renderer.available() {
            sink.report(&format!("{}: not installed, skipping", renderer.name()), None);
            continue;
        }
        sink.report(&format!("Rendering PDF with {}", renderer.name()), Some(95));
        match renderer.render_pdf(svg, out, sink) {
            Ok(()) => {
                sink.report("PDF written", Some(98));
                return true;
            }
            Err(failure) => {
                tracing::warn!(renderer = renderer.name(), %failure, "PDF render failed");
                sink.report(
                    &format!("PDF export with {} failed: {failure}", renderer.name()),
                    None,
                );
            }
        }
    }
    sink.report("No PDF renderer succeeded", Some(98));
    false
}

/// Full-featured vector editor capability (primary).
pub struct Inkscape;

impl Renderer for Inkscape {
    fn name(&self) -> &'static str {
        "inkscape"
    }

    fn available(&self) -> bool {
        tool_available("inkscape")
    }

    fn render_png(
        &self,
        svg: &Path,
        out: &Path,
        options: &RenderOptions,
        sink: &dyn ProgressSink,
    ) -> Result<(), RenderFailure> {
        let mut command = Command::new("inkscape");
        command
            .arg(svg)
            .args([
                "--export-type=png",
                "--export-background-opacity=0",
                "--export-area-drawing",
            ])
            .arg(format!("--export-filename={}", out.display()));

        if let Some(width) = options.width_px {
            sink.report(&format!("Target width: {width} px"), Some(85));
            command.arg(format!("--export-width={width}"));
            if let Some(height) = options.height_px {
                command.arg(format!("--export-height={height}"));
            }
        } else {
            sink.report(&format!("DPI: {}", options.dpi), Some(85));
            command.arg(format!("--export-dpi={}", options.dpi));
        }

        let result = run_polled(&mut command, sink, "Rendering PNG", 86, 91)?;
        if result.success {
            Ok(())
        } else {
            Err(RenderFailure {
                reason: result.output,
            })
        }
    }

    fn render_pdf(
        &self,
        svg: &Path,
        out: &Path,
        _sink: &dyn ProgressSink,
    ) -> Result<(), RenderFailure> {
        let mut command = Command::new("inkscape");
        command
            .arg(svg)
            .args(["--export-type=pdf", "--export-area-drawing"])
            .arg(format!("--export-filename={}", out.display()));

        let result = run_captured(&mut command)?;
        if result.success {
            Ok(())
        } else {
            Err(RenderFailure {
                reason: result.output,
            })
        }
    }
}

/// Lightweight dedicated SVG renderer capability (secondary).
///
/// Narrower sizing support than the primary: pixel width/height only;
/// when neither is given the tool's default density applies.
pub struct RsvgConvert;

impl Renderer for RsvgConvert {
    fn name(&self) -> &'static str {
        "rsvg-convert"
    }

    fn available(&self) -> bool {
        tool_available("rsvg-convert")
    }

    fn render_png(
        &self,
        svg: &Path,
        out: &Path,
        options: &RenderOptions,
        sink: &dyn ProgressSink,
    ) -> Result<(), RenderFailure> {
        let mut command = Command::new("rsvg-convert");
        command.args(["-f", "png", "-o"]).arg(out);

        if let Some(width) = options.width_px {
            sink.report(&format!("Target width: {width} px"), Some(85));
            command.args(["-w", &width.to_string()]);
            if let Some(height) = options.height_px {
                command.args(["-h", &height.to_string()]);
            }
        } else {
            sink.report(
                &format!("DPI {} approximated; tool prefers pixel sizing", options.dpi),
                Some(85),
            );
        }
        command.arg(svg);

        let result = run_polled(&mut command, sink, "Rendering PNG", 86, 91)?;
        if result.success {
            Ok(())
        } else {
            Err(RenderFailure {
                reason: result.output,
            })
        }
    }

    fn render_pdf(
        &self,
        svg: &Path,
        out: &Path,
        _sink: &dyn ProgressSink,
    ) -> Result<(), RenderFailure> {
        let mut command = Command::new("rsvg-convert");
        command.args(["-f", "pdf", "-o"]).arg(out).arg(svg);

        let result = run_captured(&mut command)?;
        if result.success {
            Ok(())
        } else {
            Err(RenderFailure {
                reason: result.output,
            })
        }
    }
}

/// In-process rendering capability (tertiary, last resort).
///
/// Always available; used only when no external renderer is present.
/// PNG goes through resvg into a transparent pixmap cropped to the
/// content bounds; PDF goes through svg2pdf (uncropped; the upstream
/// outline is already tight after the PNG-path bounds logic, and the
/// print document carries the full canvas like the external tools'
/// non-crop mode).
pub struct Builtin;

impl Renderer for Builtin {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn available(&self) -> bool {
        true
    }

    fn render_png(
        &self,
        svg: &Path,
        out: &Path,
        options: &RenderOptions,
        sink: &dyn ProgressSink,
    ) -> Result<(), RenderFailure> {
        let data = fs::read(svg)?;
        let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
            .map_err(|e| RenderFailure {
                reason: format!("SVG parse failed: {e}"),
            })?;

        // Empty document: fall back to the declared canvas.
        let bounds = content_bounds(&tree)
            .or_else(|| {
                let size = tree.size();
                usvg::Rect::from_xywh(0.0, 0.0, size.width(), size.height())
            })
            .unwrap_or_else(unit_rect);

        #[allow(clippy::cast_precision_loss)]
        let scale_x = options.width_px.map_or_else(
            || f64::from(options.dpi) / 96.0,
            |w| f64::from(w) / f64::from(bounds.width()),
        );
        #[allow(clippy::cast_precision_loss)]
        let scale_y = options
            .height_px
            .filter(|_| options.width_px.is_some())
            .map_or(scale_x, |h| f64::from(h) / f64::from(bounds.height()));

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let width = ((f64::from(bounds.width()) * scale_x).ceil() as u32).max(1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let height = ((f64::from(bounds.height()) * scale_y).ceil() as u32).max(1);

        sink.report(&format!("Rendering PNG in-process at {width}x{height}"), Some(86));

        let Some(mut pixmap) = resvg::tiny_skia::Pixmap::new(width, height) else {
            return Err(RenderFailure {
                reason: format!("cannot allocate {width}x{height} pixmap"),
            });
        };

        #[allow(clippy::cast_possible_truncation)]
        let transform = resvg::tiny_skia::Transform::from_scale(scale_x as f32, scale_y as f32)
            .pre_translate(-bounds.x(), -bounds.y());
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let png = pixmap.encode_png().map_err(|e| RenderFailure {
            reason: format!("PNG encode failed: {e}"),
        })?;
        fs::write(out, png)?;
        Ok(())
    }

    fn render_pdf(
        &self,
        svg: &Path,
        out: &Path,
        _sink: &dyn ProgressSink,
    ) -> Result<(), RenderFailure> {
        let data = fs::read(svg)?;
        let tree = svg2pdf::usvg::Tree::from_data(&data, &svg2pdf::usvg::Options::default())
            .map_err(|e| RenderFailure {
                reason: format!("SVG parse failed: {e}"),
            })?;

        let pdf = svg2pdf::to_pdf(
            &tree,
            svg2pdf::ConversionOptions::default(),
            svg2pdf::PageOptions::default(),
        )
        .map_err(|e| RenderFailure {
            reason: format!("PDF conversion failed: {e}"),
        })?;

        fs::write(out, pdf)?;
        Ok(())
    }
}

/// Stroke-inclusive bounding box of all drawn content.
///
/// Traverses every node and unions the stroke bounding boxes, so the
/// crop never clips a stroked edge.
fn content_bounds(tree: &usvg::Tree) -> Option<usvg::Rect> {
    let mut bounds: Option<usvg::Rect> = None;
    collect_bounds(tree.root(), &mut bounds);
    bounds
}

fn collect_bounds(group: &usvg::Group, bounds: &mut Option<usvg::Rect>) {
    for node in group.children() {
        *bounds = merge_bounds(*bounds, node.abs_stroke_bounding_box());
        if let usvg::Node::Group(nested) = node {
            collect_bounds(nested, bounds);
        }
    }
}

fn merge_bounds(a: Option<usvg::Rect>, b: usvg::Rect) -> Option<usvg::Rect> {
    match a {
        Some(existing) => {
            let min_x = existing.x().min(b.x());
            let min_y = existing.y().min(b.y());
            let max_x = existing.right().max(b.right());
            let max_y = existing.bottom().max(b.bottom());
            usvg::Rect::from_xywh(min_x, min_y, max_x - min_x, max_y - min_y)
        }
        None => Some(b),
    }
}

fn unit_rect() -> usvg::Rect {
    // 1x1 is always representable; this cannot actually fail.
    #[allow(clippy::unwrap_used)]
    usvg::Rect::from_xywh(0.0, 0.0, 1.0, 1.0).unwrap()
}
