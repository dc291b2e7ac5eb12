//! Generate the frame sequence and render it.

use std::path::PathBuf;

use anyhow::Context;

use geoprojector_common::config::AppConfig;
use geoprojector_render::{export_sequence, render_sequence_text, ExportFormat, ExportJob};

use super::{prepare, RenderArgs, RunArgs};

/// Where the frames go.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Animated GIF; `None` uses the configured output directory.
    Gif(Option<PathBuf>),
    /// Numbered PNGs in a directory.
    Frames(PathBuf),
    /// Text frames on stdout.
    Print,
}

impl Target {
    pub fn select(output: Option<PathBuf>, frames_dir: Option<PathBuf>, print: bool) -> Self {
        match (print, frames_dir) {
            (true, _) => Self::Print,
            (false, Some(dir)) => Self::Frames(dir),
            (false, None) => Self::Gif(output),
        }
    }
}

pub fn run(
    app_config: &AppConfig,
    points_path: PathBuf,
    run_args: &RunArgs,
    render_args: &RenderArgs,
    target: Target,
) -> anyhow::Result<()> {
    let options = render_args
        .options(&app_config.render)
        .context("Invalid render settings")?;

    let prepared = prepare(&points_path, run_args)?;
    println!(
        "Projecting {} points from {}",
        prepared.points.len(),
        points_path.display()
    );
    println!(
        "  Step: {}  Accumulation: {}",
        prepared.config.step, prepared.config.accumulation
    );

    let Some(generator) = prepared.generator else {
        anyhow::bail!("No points in {}; nothing to animate", points_path.display());
    };
    let sequence = generator.generate(prepared.points)?.collect_sequence()?;
    println!(
        "  Frames: {}  On grid: {}  Outside: {}",
        sequence.len(),
        sequence.stats.projected,
        sequence.stats.excluded
    );

    let job = match target {
        Target::Print => {
            print!("\n{}", render_sequence_text(&sequence, options.scale));
            return Ok(());
        }
        Target::Frames(dir) => ExportJob {
            output_path: dir,
            format: ExportFormat::PngFrames,
            options,
        },
        Target::Gif(output) => ExportJob {
            output_path: output.unwrap_or_else(|| app_config.output_dir.join("animation.gif")),
            format: ExportFormat::Gif,
            options,
        },
    };

    let written = export_sequence(&job, &sequence)?;
    match job.format {
        ExportFormat::Gif => println!("\nAnimation written: {}", job.output_path.display()),
        ExportFormat::PngFrames => println!(
            "\n{} frames written to {}",
            written.len(),
            job.output_path.display()
        ),
    }

    Ok(())
}
