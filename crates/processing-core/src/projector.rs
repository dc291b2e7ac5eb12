//! Coordinate projection onto the grid.
//!
//! `row = floor((lat - origin.lat) / lat_delta)` and
//! `col = floor((lon - origin.lon) / lon_delta)`. Anything that lands outside
//! `[0, rows) x [0, cols)` is dropped rather than clamped.

use geoprojector_model::{GridSpec, Point};

/// Map a point to its `(row, col)` cell, or `None` if it falls outside the grid.
pub fn project(point: &Point, grid: &GridSpec) -> Option<(usize, usize)> {
    project_coord(point.latitude, point.longitude, grid)
}

/// Map a bare coordinate to its `(row, col)` cell.
pub fn project_coord(lat: f64, lon: f64, grid: &GridSpec) -> Option<(usize, usize)> {
    let row = axis_index(lat, grid.origin.lat, grid.cell_size.lat_delta, grid.rows())?;
    let col = axis_index(lon, grid.origin.lon, grid.cell_size.lon_delta, grid.cols())?;
    Some((row, col))
}

fn axis_index(value: f64, origin: f64, delta: f64, len: usize) -> Option<usize> {
    let idx = ((value - origin) / delta).floor();
    // NaN fails both comparisons.
    if idx >= 0.0 && idx < len as f64 {
        Some(idx as usize)
    } else {
        None
    }
}
