//! Frame-by-frame accumulation.
//!
//! # Algorithm
//!
//! 1. **Sort** points by timestamp (stable; ties keep input order).
//! 2. **Partition** into steps: `count(N)` takes N points per step,
//!    `window(D)` buckets by `floor((t - t0) / D)` from the earliest point.
//! 3. **Accumulate** each step: reset first under `windowed`, then project
//!    every point and add its weight to the grid.
//! 4. **Emit** one snapshot per step, including steps where nothing landed.
//!
//! Generation is lazy: [`SnapshotSequence`] is an iterator that does the work
//! of one step per `next()` call and cannot be rewound.

use std::iter::FusedIterator;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use geoprojector_common::{GeoError, GeoResult};
use geoprojector_model::{AccumulationPolicy, GridSpec, Point, RunConfig, StepPolicy};
use serde::Serialize;

use crate::buffer::{FrameMeta, GridBuffer, GridSnapshot};
use crate::projector::project;

/// Upper bound on frames for `window` runs. A window this fine for the data
/// span is a configuration mistake. `count` runs are bounded by their input.
pub const MAX_STEPS: usize = 1 << 20;

/// Fixed configuration for producing snapshot sequences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceGenerator {
    grid: GridSpec,
    step: StepPolicy,
    accumulation: AccumulationPolicy,
}

impl SequenceGenerator {
    /// Validate the configuration and build a generator.
    pub fn new(
        grid: GridSpec,
        step: StepPolicy,
        accumulation: AccumulationPolicy,
    ) -> GeoResult<Self> {
        grid.validate()?;
        step.validate()?;
        Ok(Self {
            grid,
            step,
            accumulation,
        })
    }

    /// Build a generator from a run config, resolving its grid against `points`.
    pub fn from_run_config(config: &RunConfig, points: &[Point]) -> GeoResult<Self> {
        config.validate()?;
        let grid = config.resolve_grid(points)?;
        Self::new(grid, config.step, config.accumulation)
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn step_policy(&self) -> StepPolicy {
        self.step
    }

    pub fn accumulation(&self) -> AccumulationPolicy {
        self.accumulation
    }

    /// Validate and sort `points`, then return the lazy frame iterator.
    ///
    /// Any invalid point fails the whole call before a frame is produced.
    pub fn generate(&self, points: impl IntoIterator<Item = Point>) -> GeoResult<SnapshotSequence> {
        let mut points: Vec<Point> = points.into_iter().collect();
        for (index, point) in points.iter().enumerate() {
            point.validate(index)?;
        }
        points.sort_by_key(|p| p.timestamp);

        let (step_of, window): (Vec<usize>, Option<(DateTime<Utc>, TimeDelta)>) = match self.step {
            StepPolicy::Count(n) => ((0..points.len()).map(|i| i / n).collect(), None),
            StepPolicy::Window(duration) => {
                let t0 = points.first().map(|p| p.timestamp);
                let steps = match t0 {
                    Some(t0) => window_steps(&points, t0, duration)?,
                    None => Vec::new(),
                };
                let window = t0
                    .map(|t0| {
                        TimeDelta::from_std(duration)
                            .map(|d| (t0, d))
                            .map_err(|e| GeoError::config(format!("window too long: {e}")))
                    })
                    .transpose()?;
                (steps, window)
            }
        };

        let step_count: usize = step_of.last().map_or(0, |last| last + 1);
        if matches!(self.step, StepPolicy::Window(_)) && step_count > MAX_STEPS {
            return Err(GeoError::config(format!(
                "{} produces {step_count} frames (limit {MAX_STEPS})",
                self.step
            )));
        }

        tracing::debug!(
            points = points.len(),
            steps = step_count,
            step = %self.step,
            accumulation = %self.accumulation,
            "Prepared snapshot sequence"
        );

        Ok(SnapshotSequence {
            grid: self.grid,
            step: self.step,
            accumulation: self.accumulation,
            buffer: GridBuffer::for_grid(&self.grid),
            points,
            step_of,
            window,
            step_count,
            next_step: 0,
            cursor: 0,
            stats: IngestStats::default(),
        })
    }
}

/// One-call form of [`SequenceGenerator::generate`].
pub fn generate(
    points: impl IntoIterator<Item = Point>,
    grid: &GridSpec,
    step: StepPolicy,
    accumulation: AccumulationPolicy,
) -> GeoResult<SnapshotSequence> {
    SequenceGenerator::new(*grid, step, accumulation)?.generate(points)
}

/// Step index of every (sorted) point under a time window anchored at `t0`.
fn window_steps(points: &[Point], t0: DateTime<Utc>, window: Duration) -> GeoResult<Vec<usize>> {
    let window_ns = window.as_nanos();
    points
        .iter()
        .map(|p| {
            let offset = p.timestamp - t0;
            let offset_ns =
                offset.num_seconds() as i128 * 1_000_000_000 + offset.subsec_nanos() as i128;
            usize::try_from(offset_ns as u128 / window_ns)
                .map_err(|_| GeoError::config("time span too large for the step window"))
        })
        .collect()
}

/// Running totals over the points consumed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IngestStats {
    pub frames: usize,
    pub points: usize,
    pub projected: usize,
    pub excluded: usize,
}

/// Lazy, single-pass iterator over the frames of one run.
///
/// Each item is a fresh [`GridSnapshot`]; the live buffer is owned by the
/// iterator and dropped with it.
#[derive(Debug)]
pub struct SnapshotSequence {
    grid: GridSpec,
    step: StepPolicy,
    accumulation: AccumulationPolicy,
    buffer: GridBuffer,
    /// Points in timestamp order.
    points: Vec<Point>,
    /// Step index of each entry in `points`; non-decreasing.
    step_of: Vec<usize>,
    /// Window anchor and length for `StepPolicy::Window`.
    window: Option<(DateTime<Utc>, TimeDelta)>,
    step_count: usize,
    next_step: usize,
    cursor: usize,
    stats: IngestStats,
}

impl SnapshotSequence {
    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Total frames this sequence yields from the start.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Drain the remaining frames into a [`FrameSequence`].
    pub fn collect_sequence(mut self) -> GeoResult<FrameSequence> {
        let mut frames = Vec::with_capacity(self.len());
        for frame in self.by_ref() {
            frames.push(frame?);
        }
        Ok(FrameSequence {
            grid: self.grid,
            step: self.step,
            accumulation: self.accumulation,
            frames,
            stats: self.stats,
        })
    }

    fn frame_meta(&self, step: usize, in_step: &[Point], projected: usize) -> FrameMeta {
        let (window_start, window_end) = match self.window {
            Some((t0, len)) => {
                let start = i32::try_from(step)
                    .ok()
                    .and_then(|k| len.checked_mul(k))
                    .and_then(|offset| t0.checked_add_signed(offset));
                let end = start.and_then(|s| s.checked_add_signed(len));
                (start, end)
            }
            None => (None, None),
        };
        FrameMeta {
            step,
            points: in_step.len(),
            projected,
            window_start,
            window_end,
            first_seen: in_step.first().map(|p| p.timestamp),
            last_seen: in_step.last().map(|p| p.timestamp),
        }
    }
}

impl Iterator for SnapshotSequence {
    type Item = GeoResult<GridSnapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_step >= self.step_count {
            return None;
        }
        let step = self.next_step;
        self.next_step += 1;

        if self.accumulation.resets_each_step() {
            self.buffer.reset();
        }

        let first = self.cursor;
        let mut projected = 0;
        while self.cursor < self.points.len() && self.step_of[self.cursor] == step {
            let point = &self.points[self.cursor];
            self.cursor += 1;
            let Some((row, col)) = project(point, &self.grid) else {
                continue;
            };
            if let Err(e) = self
                .buffer
                .accumulate_at(row, col, point.weight(), point.timestamp)
            {
                self.next_step = self.step_count;
                return Some(Err(e));
            }
            projected += 1;
        }

        let in_step = &self.points[first..self.cursor];
        let meta = self.frame_meta(step, in_step, projected);

        self.stats.frames += 1;
        self.stats.points += in_step.len();
        self.stats.projected += projected;
        self.stats.excluded += in_step.len() - projected;

        tracing::debug!(
            step,
            points = in_step.len(),
            projected,
            "Accumulated step"
        );
        if self.next_step == self.step_count {
            tracing::info!(
                frames = self.stats.frames,
                points = self.stats.points,
                excluded = self.stats.excluded,
                "Sequence complete"
            );
        }

        Some(Ok(self.buffer.snapshot().with_meta(meta)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.step_count - self.next_step;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SnapshotSequence {}

impl FusedIterator for SnapshotSequence {}

/// A fully materialised run: every frame plus the settings that made it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSequence {
    pub grid: GridSpec,
    pub step: StepPolicy,
    pub accumulation: AccumulationPolicy,
    pub frames: Vec<GridSnapshot>,
    pub stats: IngestStats,
}

impl FrameSequence {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&GridSnapshot> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GridSnapshot> {
        self.frames.iter()
    }

    /// Largest cell value across all frames.
    pub fn max_value(&self) -> f64 {
        self.frames
            .iter()
            .map(GridSnapshot::max_value)
            .fold(0.0_f64, f64::max)
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a GridSnapshot;
    type IntoIter = std::slice::Iter<'a, GridSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
