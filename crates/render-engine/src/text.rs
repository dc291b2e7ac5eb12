//! Plain-text rendering of snapshots for terminals and logs.

use std::fmt::Write;

use geoprojector_core::{FrameSequence, GridSnapshot};

use crate::colormap::IntensityScale;

const EMPTY: char = '.';
const RAMP: [char; 8] = ['-', ':', '=', '+', '*', '#', '%', '@'];

fn glyph(value: f64, max: f64, scale: IntensityScale) -> char {
    if value.is_nan() || value <= 0.0 {
        return EMPTY;
    }
    let n = scale.normalize(value, max);
    let idx = ((n * RAMP.len() as f64).ceil() as usize).clamp(1, RAMP.len());
    RAMP[idx - 1]
}

/// Render a snapshot as a character grid, north (last row) first.
///
/// Empty cells print as `.`; occupied cells use a density ramp normalized
/// against the snapshot's own maximum.
pub fn render_text(snapshot: &GridSnapshot) -> String {
    render_text_with(snapshot, snapshot.max_value(), IntensityScale::Linear)
}

/// Like [`render_text`] with an explicit normalization ceiling and scale.
pub fn render_text_with(snapshot: &GridSnapshot, max: f64, scale: IntensityScale) -> String {
    let mut out = String::with_capacity(snapshot.rows() * (snapshot.cols() * 2 + 1));
    for row in (0..snapshot.rows()).rev() {
        let Some(cells) = snapshot.row(row) else {
            continue;
        };
        let line: Vec<String> = cells
            .iter()
            .map(|&v| glyph(v, max, scale).to_string())
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// Render every frame with a header line, using the sequence-wide maximum.
pub fn render_sequence_text(sequence: &FrameSequence, scale: IntensityScale) -> String {
    let max = sequence.max_value();
    let mut out = String::new();
    for frame in sequence {
        let meta = frame.meta();
        let _ = write!(
            out,
            "frame {} ({} points, {} on grid",
            meta.step, meta.points, meta.projected
        );
        if let Some(start) = meta.start() {
            let _ = write!(out, ", from {}", start.to_rfc3339());
        }
        out.push_str(")\n");
        out.push_str(&render_text_with(frame, max, scale));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoprojector_core::GridBuffer;

    #[test]
    fn test_north_up_layout() {
        let mut buffer = GridBuffer::new(2, 2);
        buffer.accumulate(0, 0, 1.0).unwrap();
        buffer.accumulate(1, 1, 2.0).unwrap();

        assert_eq!(render_text(&buffer.snapshot()), ". @\n+ .\n");
    }

    #[test]
    fn test_empty_snapshot_is_all_dots() {
        let buffer = GridBuffer::new(2, 3);
        assert_eq!(render_text(&buffer.snapshot()), ". . .\n. . .\n");
    }

    #[test]
    fn test_small_values_stay_visible() {
        assert_eq!(glyph(0.001, 1000.0, IntensityScale::Linear), '-');
        assert_eq!(glyph(1000.0, 1000.0, IntensityScale::Linear), '@');
        assert_eq!(glyph(0.0, 1000.0, IntensityScale::Log), '.');
    }
}
