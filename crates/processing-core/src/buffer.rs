//! Grid buffer and immutable snapshots.

use chrono::{DateTime, Utc};
use geoprojector_common::{GeoError, GeoResult};
use geoprojector_model::GridSpec;
use serde::Serialize;

/// The live accumulation grid for one run. Cells are row-major.
///
/// Next to each value the buffer keeps the timestamp of the latest point
/// that landed in the cell, cleared together with the values on reset.
#[derive(Debug, Clone)]
pub struct GridBuffer {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
    last_seen: Vec<Option<DateTime<Utc>>>,
}

impl GridBuffer {
    /// A zeroed `rows x cols` buffer.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0.0; rows * cols],
            last_seen: vec![None; rows * cols],
        }
    }

    /// A zeroed buffer shaped like `grid`.
    pub fn for_grid(grid: &GridSpec) -> Self {
        Self::new(grid.rows(), grid.cols())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Add `value` to cell `(row, col)`.
    ///
    /// An index outside the grid means the projector handed over a cell it
    /// should have dropped; it is reported as [`GeoError::OutOfBounds`].
    pub fn accumulate(&mut self, row: usize, col: usize, value: f64) -> GeoResult<()> {
        let idx = self.checked_index(row, col)?;
        self.cells[idx] += value;
        Ok(())
    }

    /// [`accumulate`](Self::accumulate) and record `at` as the cell's latest
    /// observation if it is newer than the one held.
    pub fn accumulate_at(
        &mut self,
        row: usize,
        col: usize,
        value: f64,
        at: DateTime<Utc>,
    ) -> GeoResult<()> {
        let idx = self.checked_index(row, col)?;
        self.cells[idx] += value;
        let seen = &mut self.last_seen[idx];
        if seen.map_or(true, |prev| at > prev) {
            *seen = Some(at);
        }
        Ok(())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.index(row, col).map(|idx| self.cells[idx])
    }

    /// Sum of all cells.
    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }

    /// Timestamp of the latest point recorded in `(row, col)`.
    pub fn last_seen(&self, row: usize, col: usize) -> Option<DateTime<Utc>> {
        self.index(row, col).and_then(|idx| self.last_seen[idx])
    }

    /// Zero every cell and forget every timestamp.
    pub fn reset(&mut self) {
        self.cells.fill(0.0);
        self.last_seen.fill(None);
    }

    /// Copy the current state into a snapshot with no frame metadata.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.clone(),
            last_seen: self.last_seen.clone(),
            meta: FrameMeta::default(),
        }
    }

    fn checked_index(&self, row: usize, col: usize) -> GeoResult<usize> {
        self.index(row, col).ok_or(GeoError::OutOfBounds {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        })
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }
}

/// Per-frame bookkeeping attached by the sequence generator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FrameMeta {
    /// Zero-based step index; equals the frame index.
    pub step: usize,
    /// Points that belonged to this step.
    pub points: usize,
    /// Of those, how many landed on the grid.
    pub projected: usize,
    /// Window bounds `[window_start, window_end)`; set only for `window` steps.
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    /// Earliest and latest timestamp among this step's points, under either
    /// policy. `None` when the step holds no points.
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl FrameMeta {
    /// Best available start time: the window start, else the first point.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.window_start.or(self.first_seen)
    }
}

/// An immutable copy of the grid at one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSnapshot {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
    last_seen: Vec<Option<DateTime<Utc>>>,
    meta: FrameMeta,
}

impl GridSnapshot {
    pub(crate) fn with_meta(mut self, meta: FrameMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn meta(&self) -> &FrameMeta {
        &self.meta
    }

    /// Row-major cell values.
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.cells[row * self.cols + col])
    }

    /// Timestamp of the latest point held in `(row, col)`. Under windowed
    /// accumulation this only covers the current step.
    pub fn last_seen(&self, row: usize, col: usize) -> Option<DateTime<Utc>> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.last_seen[row * self.cols + col]
    }

    /// Cells of one row, west to east.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.rows {
            return None;
        }
        Some(&self.cells[row * self.cols..(row + 1) * self.cols])
    }

    /// Nested `[row][col]` copy of the values.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.cols == 0 {
            return Vec::new();
        }
        self.cells.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }

    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }

    pub fn max_value(&self) -> f64 {
        self.cells.iter().copied().fold(0.0_f64, f64::max)
    }

    /// Number of cells with a non-zero value.
    pub fn active_cells(&self) -> usize {
        self.cells.iter().filter(|v| **v != 0.0).count()
    }

    /// True if both snapshots hold the same values, ignoring frame metadata.
    pub fn same_cells(&self, other: &GridSnapshot) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.cells == other.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_zeroed() {
        let buffer = GridBuffer::new(3, 4);
        assert_eq!(buffer.total(), 0.0);
        assert_eq!(buffer.snapshot().to_rows(), vec![vec![0.0; 4]; 3]);
    }

    #[test]
    fn test_accumulate_adds() {
        let mut buffer = GridBuffer::new(2, 2);
        buffer.accumulate(1, 0, 1.0).unwrap();
        buffer.accumulate(1, 0, 2.5).unwrap();
        assert_eq!(buffer.get(1, 0), Some(3.5));
        assert_eq!(buffer.get(0, 1), Some(0.0));
        assert_eq!(buffer.get(2, 0), None);
    }

    #[test]
    fn test_accumulate_out_of_bounds() {
        let mut buffer = GridBuffer::new(2, 3);
        let err = buffer.accumulate(0, 3, 1.0).unwrap_err();
        assert!(matches!(
            err,
            GeoError::OutOfBounds {
                row: 0,
                col: 3,
                rows: 2,
                cols: 3
            }
        ));
        assert!(buffer.accumulate(2, 0, 1.0).is_err());
        assert_eq!(buffer.total(), 0.0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut buffer = GridBuffer::new(2, 2);
        buffer.accumulate(0, 0, 1.0).unwrap();
        let before = buffer.snapshot();

        buffer.accumulate(0, 0, 1.0).unwrap();
        buffer.reset();

        assert_eq!(before.cell(0, 0), Some(1.0));
        assert_eq!(buffer.get(0, 0), Some(0.0));
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut buffer = GridBuffer::new(2, 3);
        buffer.accumulate(1, 2, 4.0).unwrap();
        assert_eq!(buffer.snapshot(), buffer.snapshot());
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut buffer = GridBuffer::new(2, 2);
        buffer.accumulate(0, 1, 3.0).unwrap();
        buffer.accumulate(1, 1, 2.0).unwrap();
        buffer.reset();
        assert_eq!(buffer.total(), 0.0);
    }

    #[test]
    fn test_accumulate_at_keeps_latest_timestamp() {
        let t = |secs| DateTime::from_timestamp(secs, 0).unwrap();
        let mut buffer = GridBuffer::new(2, 2);
        buffer.accumulate_at(0, 1, 1.0, t(50)).unwrap();
        buffer.accumulate_at(0, 1, 1.0, t(20)).unwrap();
        buffer.accumulate(1, 1, 1.0).unwrap();

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.cell(0, 1), Some(2.0));
        assert_eq!(snapshot.last_seen(0, 1), Some(t(50)));
        assert_eq!(snapshot.last_seen(1, 1), None);
        assert_eq!(snapshot.last_seen(5, 5), None);
        assert!(buffer.accumulate_at(2, 0, 1.0, t(1)).is_err());

        buffer.reset();
        assert_eq!(buffer.last_seen(0, 1), None);
        assert_eq!(snapshot.last_seen(0, 1), Some(t(50)));
    }

    #[test]
    fn test_snapshot_accessors() {
        let mut buffer = GridBuffer::new(2, 3);
        buffer.accumulate(0, 0, 1.0).unwrap();
        buffer.accumulate(1, 2, 5.0).unwrap();
        let snapshot = buffer.snapshot();

        assert_eq!(snapshot.row(1), Some(&[0.0, 0.0, 5.0][..]));
        assert_eq!(snapshot.row(2), None);
        assert_eq!(snapshot.max_value(), 5.0);
        assert_eq!(snapshot.total(), 6.0);
        assert_eq!(snapshot.active_cells(), 2);
        assert_eq!(snapshot.cells().len(), 6);
    }
}
