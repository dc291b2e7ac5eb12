//! Geoprojector CLI: project timed geographic points onto a grid and animate them.
//!
//! Usage:
//!   geoprojector animate <POINTS>    Generate frames and render GIF, PNGs, or text
//!   geoprojector inspect <POINTS>    Print a per-frame summary
//!   geoprojector validate <POINTS>   Check points and run config
//!   geoprojector init                Write a default run config
//!
//! Exits with 2 on bad input or configuration and 1 on other failures.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use geoprojector_common::config::AppConfig;
use geoprojector_common::GeoError;

mod commands;

use commands::{RenderArgs, RunArgs};

#[derive(Parser)]
#[command(
    name = "geoprojector",
    about = "Project timed geographic points onto a grid and animate the result",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the frame sequence and render it
    Animate {
        /// Points file (JSONL, JSON array, or frames layout)
        points: PathBuf,

        #[command(flatten)]
        run: RunArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Output GIF path [default: <output_dir>/animation.gif]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write numbered PNG frames into this directory instead of a GIF
        #[arg(long, conflicts_with = "output")]
        frames_dir: Option<PathBuf>,

        /// Print frames to the console instead of writing images
        #[arg(long, conflicts_with_all = ["output", "frames_dir"])]
        print: bool,
    },

    /// Print a per-frame summary of the sequence
    Inspect {
        points: PathBuf,

        #[command(flatten)]
        run: RunArgs,

        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a points file against a run config
    Validate {
        points: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Write a default run config
    Init {
        /// Output path
        #[arg(short, long, default_value = "geoprojector.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        /// Write the default application config to its standard location instead
        #[arg(long, conflicts_with = "output")]
        app_config: bool,
    },
}

/// Exit status for bad input or configuration, as opposed to I/O or render failures.
const EXIT_INPUT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let app_config = AppConfig::load();

    let mut logging = app_config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    geoprojector_common::logging::init_logging(&logging);
    tracing::debug!(
        config = %geoprojector_common::config::config_file_path().display(),
        output_dir = %app_config.output_dir.display(),
        "Application config loaded"
    );

    let result = match cli.command {
        Commands::Animate {
            points,
            run,
            render,
            output,
            frames_dir,
            print,
        } => commands::animate::run(
            &app_config,
            points,
            &run,
            &render,
            commands::animate::Target::select(output, frames_dir, print),
        ),
        Commands::Inspect { points, run, json } => commands::inspect::run(points, &run, json),
        Commands::Validate { points, run } => commands::validate::run(points, &run),
        Commands::Init {
            output,
            force,
            app_config,
        } => commands::init::run(output, force, app_config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

fn exit_status(err: &anyhow::Error) -> u8 {
    let input_error = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<GeoError>())
        .any(GeoError::is_input_error);
    if input_error {
        EXIT_INPUT_ERROR
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_status_classifies_input_errors() {
        let config: anyhow::Error = GeoError::config("rows must be >= 1").into();
        assert_eq!(exit_status(&config), EXIT_INPUT_ERROR);

        let wrapped = Err::<(), _>(GeoError::malformed(3, "latitude out of range"))
            .context("Failed to load points from fire.jsonl")
            .unwrap_err();
        assert_eq!(exit_status(&wrapped), EXIT_INPUT_ERROR);

        let render: anyhow::Error = GeoError::render("encoder failed").into();
        assert_eq!(exit_status(&render), 1);
        assert_eq!(exit_status(&anyhow::anyhow!("no points")), 1);
    }
}
