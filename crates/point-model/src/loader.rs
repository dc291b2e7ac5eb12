//! Point file loading.
//!
//! Three layouts are understood:
//! - **JSONL**: one point object per line (see [`crate::point`]).
//! - **JSON array**: `[{"lat": .., "lon": .., "t": ..}, ...]`.
//! - **Frames**: `[[[lat, lon], ...], ...]`, one inner array per frame. Frame
//!   `k` is stamped `frame_start + k * frame_step`.
//!
//! Every loaded point is validated. The first bad record aborts the load.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use geoprojector_common::{GeoError, GeoResult};
use serde::{Deserialize, Serialize};

use crate::point::{parse_points, Point};

/// On-disk layout of a points file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointFormat {
    Jsonl,
    JsonArray,
    Frames,
}

impl PointFormat {
    /// Guess the format from the file extension, then from the content.
    pub fn detect(path: &Path, content: &str) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if matches!(ext.as_deref(), Some("jsonl" | "ndjson")) {
            return Self::Jsonl;
        }
        Self::detect_content(content)
    }

    /// Guess the format from the content alone.
    pub fn detect_content(content: &str) -> Self {
        let body = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect::<Vec<_>>()
            .join("\n");
        let Some(rest) = body.strip_prefix('[') else {
            return Self::Jsonl;
        };
        if rest.trim_start().starts_with('[') {
            Self::Frames
        } else {
            Self::JsonArray
        }
    }
}

impl fmt::Display for PointFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jsonl => f.write_str("jsonl"),
            Self::JsonArray => f.write_str("json"),
            Self::Frames => f.write_str("frames"),
        }
    }
}

impl FromStr for PointFormat {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" | "ndjson" => Ok(Self::Jsonl),
            "json" | "json_array" => Ok(Self::JsonArray),
            "frames" => Ok(Self::Frames),
            other => Err(GeoError::config(format!(
                "unknown point format {other:?} (expected jsonl, json, or frames)"
            ))),
        }
    }
}

/// Options for [`load_points`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Force a format instead of detecting it.
    pub format: Option<PointFormat>,
    /// Timestamp of frame 0 in the frames layout.
    pub frame_start: DateTime<Utc>,
    /// Time between consecutive frames in the frames layout.
    pub frame_step: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            format: None,
            frame_start: DateTime::<Utc>::default(),
            frame_step: Duration::from_secs(60),
        }
    }
}

/// Load and validate points from a file.
pub fn load_points(path: impl AsRef<Path>, options: &LoadOptions) -> GeoResult<Vec<Point>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(GeoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let format = options
        .format
        .unwrap_or_else(|| PointFormat::detect(path, &content));

    let points = parse_with_format(&content, format, options)?;
    tracing::info!(
        path = %path.display(),
        format = %format,
        points = points.len(),
        "Loaded points"
    );
    Ok(points)
}

/// Parse already-read content in the given format.
pub fn parse_with_format(
    content: &str,
    format: PointFormat,
    options: &LoadOptions,
) -> GeoResult<Vec<Point>> {
    match format {
        PointFormat::Jsonl => parse_points(content),
        PointFormat::JsonArray => parse_json_array(content),
        PointFormat::Frames => parse_frames(content, options.frame_start, options.frame_step),
    }
}

/// Parse a JSON array of point objects. Errors carry the 0-based record index.
pub fn parse_json_array(content: &str) -> GeoResult<Vec<Point>> {
    let records: Vec<serde_json::Value> = serde_json::from_str(content)?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let point: Point = serde_json::from_value(record)
                .map_err(|e| GeoError::malformed(index, e.to_string()))?;
            point.validate(index)?;
            Ok(point)
        })
        .collect()
}

/// Parse the frame-grouped `[[[lat, lon], ...], ...]` layout.
///
/// Errors carry the 0-based frame index.
pub fn parse_frames(
    content: &str,
    frame_start: DateTime<Utc>,
    frame_step: Duration,
) -> GeoResult<Vec<Point>> {
    if frame_step.is_zero() {
        return Err(GeoError::config(
            "frame step must be longer than zero; frames would share one timestamp",
        ));
    }
    let step = TimeDelta::from_std(frame_step)
        .map_err(|e| GeoError::config(format!("frame step {frame_step:?} too large: {e}")))?;
    let frames: Vec<Vec<serde_json::Value>> = serde_json::from_str(content)?;

    let mut points = Vec::new();
    for (frame_idx, frame) in frames.iter().enumerate() {
        let timestamp = i32::try_from(frame_idx)
            .ok()
            .and_then(|k| step.checked_mul(k))
            .and_then(|offset| frame_start.checked_add_signed(offset))
            .ok_or_else(|| {
                GeoError::malformed(frame_idx, "frame timestamp overflows the calendar")
            })?;

        for (pair_idx, pair) in frame.iter().enumerate() {
            let coords = pair
                .as_array()
                .filter(|values| values.len() == 2)
                .and_then(|values| Some((values[0].as_f64()?, values[1].as_f64()?)))
                .ok_or_else(|| {
                    GeoError::malformed(
                        frame_idx,
                        format!("pair {pair_idx} is not a [lat, lon] number pair: {pair}"),
                    )
                })?;
            let point = Point::new(coords.0, coords.1, timestamp);
            point.validate(frame_idx)?;
            points.push(point);
        }
    }
    Ok(points)
}
