//! Write a default run config, or the default application config.

use std::path::{Path, PathBuf};

use anyhow::Context;
use geoprojector_common::config::{config_file_path, AppConfig};
use geoprojector_model::{GridLayout, RunConfig};

pub fn run(output: PathBuf, force: bool, app_config: bool) -> anyhow::Result<()> {
    if app_config {
        let path = config_file_path();
        write_app_config(&path, force)?;
        println!("Application config written to {}", path.display());
        return Ok(());
    }

    refuse_overwrite(&output, force)?;

    let config = RunConfig::default();
    config
        .save(&output)
        .context("Failed to write run config")?;

    println!("Run config written to {}", output.display());
    println!("  Step: {}", config.step);
    println!("  Accumulation: {}", config.accumulation);
    if let GridLayout::Centered(grid) = &config.grid {
        println!(
            "  Grid: {}x{} cells of {} km, centred on the earliest point",
            grid.rows, grid.cols, grid.cell_size_km
        );
    }

    Ok(())
}

fn refuse_overwrite(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}

/// Write `AppConfig::default()` to `path`.
pub fn write_app_config(path: &Path, force: bool) -> anyhow::Result<()> {
    refuse_overwrite(path, force)?;
    AppConfig::default()
        .save_to(path)
        .with_context(|| format!("Failed to write application config to {}", path.display()))
}
