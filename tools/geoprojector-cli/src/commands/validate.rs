//! Validate a points file against a run config.

use std::path::PathBuf;

use geoprojector_core::project;

use super::{prepare, RunArgs};

pub fn run(points_path: PathBuf, run_args: &RunArgs) -> anyhow::Result<()> {
    println!("Validating points at: {}", points_path.display());

    let prepared = prepare(&points_path, run_args)?;
    println!("  Points: {}", prepared.points.len());

    let Some(generator) = &prepared.generator else {
        println!("  Grid: centred on the earliest point (unresolved)");
        println!(
            "  Step: {}  Accumulation: {}",
            prepared.config.step, prepared.config.accumulation
        );
        println!("\nNo points; the run would produce no frames.");
        return Ok(());
    };
    let grid = generator.grid();
    let extent = grid.extent();

    if let (Some(first), Some(last)) = (
        prepared.points.iter().map(|p| p.timestamp).min(),
        prepared.points.iter().map(|p| p.timestamp).max(),
    ) {
        println!(
            "  Time span: {} .. {} ({}s)",
            first.to_rfc3339(),
            last.to_rfc3339(),
            (last - first).num_seconds()
        );
    }
    println!(
        "  Grid: {}x{} cells of {:.6} x {:.6} deg",
        grid.rows(),
        grid.cols(),
        grid.cell_size.lat_delta,
        grid.cell_size.lon_delta
    );
    println!(
        "  Extent: lat [{:.6}, {:.6}), lon [{:.6}, {:.6})",
        extent.south, extent.north, extent.west, extent.east
    );
    println!(
        "  Step: {}  Accumulation: {}",
        prepared.config.step, prepared.config.accumulation
    );

    let inside = prepared
        .points
        .iter()
        .filter(|p| project(p, grid).is_some())
        .count();
    let outside = prepared.points.len() - inside;
    println!("  On grid: {inside}  Outside: {outside}");

    if prepared.points.is_empty() {
        println!("\nNo points; the run would produce no frames.");
    } else if inside == 0 {
        println!("\nNo point falls on the grid; every frame would be empty.");
    } else {
        println!("\nPoints and configuration are valid.");
    }

    Ok(())
}
