//! Print a per-frame summary of the sequence.

use std::path::PathBuf;

use geoprojector_core::IngestStats;

use super::{prepare, RunArgs};

pub fn run(points_path: PathBuf, run_args: &RunArgs, json: bool) -> anyhow::Result<()> {
    let prepared = prepare(&points_path, run_args)?;
    let step = prepared.config.step;
    let accumulation = prepared.config.accumulation;

    let Some(generator) = prepared.generator else {
        if json {
            let report = serde_json::json!({
                "grid": null,
                "step": step.to_string(),
                "accumulation": accumulation.to_string(),
                "stats": IngestStats::default(),
                "frames": [],
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("Grid: centred on the earliest point (unresolved)");
            println!("Step: {step}  Accumulation: {accumulation}");
            println!();
            println!("0 frames, 0 points");
        }
        return Ok(());
    };
    let grid = *generator.grid();

    let mut sequence = generator.generate(prepared.points)?;

    if json {
        let mut frames = Vec::with_capacity(sequence.len());
        for frame in sequence.by_ref() {
            let frame = frame?;
            frames.push(serde_json::json!({
                "step": frame.meta().step,
                "points": frame.meta().points,
                "projected": frame.meta().projected,
                "window_start": frame.meta().window_start,
                "window_end": frame.meta().window_end,
                "first_seen": frame.meta().first_seen,
                "last_seen": frame.meta().last_seen,
                "total": frame.total(),
                "max": frame.max_value(),
                "active_cells": frame.active_cells(),
            }));
        }
        let report = serde_json::json!({
            "grid": grid,
            "step": step.to_string(),
            "accumulation": accumulation.to_string(),
            "stats": sequence.stats(),
            "frames": frames,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Grid: {}x{} cells", grid.rows(), grid.cols());
    println!("Step: {step}  Accumulation: {accumulation}");
    println!();
    println!(
        "{:>6}  {:>7}  {:>9}  {:>10}  {:>8}  {:>6}  start",
        "frame", "points", "projected", "total", "max", "active"
    );

    for frame in sequence.by_ref() {
        let frame = frame?;
        let meta = frame.meta();
        let start = meta
            .start()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:>7}  {:>9}  {:>10.3}  {:>8.3}  {:>6}  {start}",
            meta.step,
            meta.points,
            meta.projected,
            frame.total(),
            frame.max_value(),
            frame.active_cells(),
        );
    }

    let stats = sequence.stats();
    println!();
    println!(
        "{} frames, {} points, {} on grid, {} outside",
        stats.frames, stats.points, stats.projected, stats.excluded
    );

    Ok(())
}
