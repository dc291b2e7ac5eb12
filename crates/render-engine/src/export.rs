//! Export of frame sequences to image files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use plotters::prelude::*;

use geoprojector_common::{GeoError, GeoResult};
use geoprojector_core::FrameSequence;

use crate::raster::{paint_snapshot, render_err, RenderOptions};

/// Output format for an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// One animated GIF, one frame per step.
    #[default]
    Gif,
    /// A directory of numbered PNG files.
    PngFrames,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gif => "gif",
            Self::PngFrames => "png",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gif" => Ok(Self::Gif),
            "png" | "png-frames" => Ok(Self::PngFrames),
            other => Err(GeoError::config(format!(
                "unknown export format {other:?} (expected gif or png)"
            ))),
        }
    }
}

/// An export job ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Output file (GIF) or directory (PNG frames).
    pub output_path: PathBuf,

    pub format: ExportFormat,

    pub options: RenderOptions,
}

/// Render the sequence as described by `job`. Returns the written files.
pub fn export_sequence(job: &ExportJob, sequence: &FrameSequence) -> GeoResult<Vec<PathBuf>> {
    tracing::info!(
        output = %job.output_path.display(),
        format = %job.format,
        frames = sequence.len(),
        "Starting export"
    );

    let written = match job.format {
        ExportFormat::Gif => {
            render_gif(sequence, &job.output_path, &job.options)?;
            vec![job.output_path.clone()]
        }
        ExportFormat::PngFrames => render_png_frames(sequence, &job.output_path, &job.options)?,
    };

    tracing::info!(files = written.len(), "Export complete");
    Ok(written)
}

fn ensure_renderable(sequence: &FrameSequence) -> GeoResult<()> {
    if sequence.is_empty() {
        return Err(GeoError::render("sequence has no frames to render"));
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> GeoResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write the whole sequence as one animated GIF.
///
/// Every frame is normalized against the sequence-wide maximum.
pub fn render_gif(
    sequence: &FrameSequence,
    path: impl AsRef<Path>,
    options: &RenderOptions,
) -> GeoResult<()> {
    ensure_renderable(sequence)?;
    let path = path.as_ref();
    ensure_parent(path)?;

    let size = options.image_size(sequence.grid.rows(), sequence.grid.cols())?;
    let max = sequence.max_value();
    let root = BitMapBackend::gif(path, size, options.frame_delay_ms)
        .map_err(render_err)?
        .into_drawing_area();

    for frame in sequence {
        paint_snapshot(&root, frame, max, options)?;
        root.present().map_err(render_err)?;
        tracing::debug!(step = frame.meta().step, "GIF frame written");
    }

    tracing::info!(
        path = %path.display(),
        width = size.0,
        height = size.1,
        frames = sequence.len(),
        "GIF written"
    );
    Ok(())
}

/// File name of the PNG for step `index`.
pub fn png_frame_name(index: usize) -> String {
    format!("frame_{index:04}.png")
}

/// Write one PNG per frame into `dir`. Returns the paths in step order.
pub fn render_png_frames(
    sequence: &FrameSequence,
    dir: impl AsRef<Path>,
    options: &RenderOptions,
) -> GeoResult<Vec<PathBuf>> {
    ensure_renderable(sequence)?;
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let size = options.image_size(sequence.grid.rows(), sequence.grid.cols())?;
    let max = sequence.max_value();

    let mut written = Vec::with_capacity(sequence.len());
    for (index, frame) in sequence.iter().enumerate() {
        let path = dir.join(png_frame_name(index));
        {
            let root = BitMapBackend::new(&path, size).into_drawing_area();
            paint_snapshot(&root, frame, max, options)?;
            root.present().map_err(render_err)?;
        }
        written.push(path);
    }

    tracing::info!(dir = %dir.display(), frames = written.len(), "PNG frames written");
    Ok(written)
}
