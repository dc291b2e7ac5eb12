use std::time::Duration;

use chrono::DateTime;
use geoprojector_core::{generate, GridBuffer, GridSnapshot};
use geoprojector_model::{AccumulationPolicy, GridSpec, Point, StepPolicy};
use proptest::prelude::*;

/// 5x5 grid of 1-degree cells over [0, 5) x [0, 5).
fn grid() -> GridSpec {
    GridSpec::from_parts(0.0, 0.0, 1.0, 1.0, 5, 5).unwrap()
}

/// Points spread over [-2, 7) so a share of them miss the grid.
fn points_strategy() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec(
        (-2.0f64..7.0, -2.0f64..7.0, 0i64..600, 0.0f64..5.0),
        0..60,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .map(|(lat, lon, secs, value)| {
                Point::new(lat, lon, DateTime::from_timestamp(secs, 0).unwrap()).with_value(value)
            })
            .collect()
    })
}

fn step_strategy() -> impl Strategy<Value = StepPolicy> {
    prop_oneof![
        (1usize..8).prop_map(StepPolicy::Count),
        (1u64..240).prop_map(|secs| StepPolicy::Window(Duration::from_secs(secs))),
    ]
}

fn accumulation_strategy() -> impl Strategy<Value = AccumulationPolicy> {
    prop_oneof![
        Just(AccumulationPolicy::Cumulative),
        Just(AccumulationPolicy::Windowed),
    ]
}

fn expected_steps(points: &[Point], step: StepPolicy) -> usize {
    if points.is_empty() {
        return 0;
    }
    match step {
        StepPolicy::Count(n) => points.len().div_ceil(n),
        StepPolicy::Window(window) => {
            let first = points.iter().map(|p| p.timestamp).min().unwrap();
            let last = points.iter().map(|p| p.timestamp).max().unwrap();
            let span = (last - first).num_seconds() as u64;
            (span / window.as_secs()) as usize + 1
        }
    }
}

fn run(
    points: &[Point],
    step: StepPolicy,
    accumulation: AccumulationPolicy,
) -> Vec<GridSnapshot> {
    generate(points.to_vec(), &grid(), step, accumulation)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

proptest! {
    #[test]
    fn frame_count_matches_step_policy(
        points in points_strategy(),
        step in step_strategy(),
        accumulation in accumulation_strategy(),
    ) {
        let frames = run(&points, step, accumulation);
        prop_assert_eq!(frames.len(), expected_steps(&points, step));
        for (i, frame) in frames.iter().enumerate() {
            prop_assert_eq!(frame.meta().step, i);
        }
    }

    #[test]
    fn generation_is_deterministic(
        points in points_strategy(),
        step in step_strategy(),
        accumulation in accumulation_strategy(),
    ) {
        let a = run(&points, step, accumulation);
        let b = run(&points, step, accumulation);
        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            let xs: Vec<u64> = x.cells().iter().map(|v| v.to_bits()).collect();
            let ys: Vec<u64> = y.cells().iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(xs, ys);
        }
    }

    #[test]
    fn cumulative_frames_never_decrease(
        points in points_strategy(),
        step in step_strategy(),
    ) {
        let frames = run(&points, step, AccumulationPolicy::Cumulative);
        for pair in frames.windows(2) {
            for (before, after) in pair[0].cells().iter().zip(pair[1].cells()) {
                prop_assert!(after >= before);
            }
        }
    }

    #[test]
    fn windowed_frames_sum_to_cumulative_total(
        points in points_strategy(),
        step in step_strategy(),
    ) {
        let windowed = run(&points, step, AccumulationPolicy::Windowed);
        let cumulative = run(&points, step, AccumulationPolicy::Cumulative);
        let windowed_sum: f64 = windowed.iter().map(GridSnapshot::total).sum();
        let cumulative_last = cumulative.last().map_or(0.0, GridSnapshot::total);
        prop_assert!((windowed_sum - cumulative_last).abs() < 1e-6);
    }

    #[test]
    fn snapshot_twice_is_equal(
        cells in prop::collection::vec((0usize..5, 0usize..5, 0.0f64..10.0), 0..30),
    ) {
        let mut buffer = GridBuffer::for_grid(&grid());
        for (row, col, value) in cells {
            buffer.accumulate(row, col, value).unwrap();
        }
        prop_assert_eq!(buffer.snapshot(), buffer.snapshot());
    }
}
