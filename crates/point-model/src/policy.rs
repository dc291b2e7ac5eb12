//! Step partitioning and accumulation policies.
//!
//! Both policies are fixed for a whole run. Their textual forms are used by
//! the CLI and config files:
//!
//! | Policy | Text | JSON |
//! |---|---|---|
//! | `StepPolicy::Count(5)` | `count:5` | `{"count": 5}` |
//! | `StepPolicy::Window(60s)` | `window:60s` | `{"window_secs": 60.0}` |
//! | `AccumulationPolicy::Cumulative` | `cumulative` | `"cumulative"` |
//! | `AccumulationPolicy::Windowed` | `windowed` | `"windowed"` |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use geoprojector_common::{GeoError, GeoResult};
use serde::{Deserialize, Serialize};

/// How time-sorted points are grouped into frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    /// Fixed number of points per step.
    Count(usize),

    /// Fixed time window per step, anchored at the earliest timestamp.
    #[serde(rename = "window_secs")]
    Window(#[serde(with = "duration_secs")] Duration),
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self::Window(Duration::from_secs(60))
    }
}

impl StepPolicy {
    pub fn validate(&self) -> GeoResult<()> {
        match self {
            Self::Count(0) => Err(GeoError::config("step count must be at least 1")),
            Self::Window(d) if d.is_zero() => {
                Err(GeoError::config("step window must be longer than zero"))
            }
            Self::Window(d) => TimeDelta::from_std(*d).map(|_| ()).map_err(|_| {
                GeoError::config(format!(
                    "step window of {}s exceeds the representable time range",
                    d.as_secs()
                ))
            }),
            Self::Count(_) => Ok(()),
        }
    }
}

impl fmt::Display for StepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "count:{n}"),
            Self::Window(d) => write!(f, "window:{}s", d.as_secs_f64()),
        }
    }
}

impl FromStr for StepPolicy {
    type Err = GeoError;

    /// Accepts `count:N` and `window:<secs>` with an optional `s`, `m`, or `h` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = s
            .split_once(':')
            .ok_or_else(|| GeoError::config(format!("expected count:N or window:D, got {s:?}")))?;

        let policy = match kind.trim().to_ascii_lowercase().as_str() {
            "count" => {
                let n = arg
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| GeoError::config(format!("invalid step count {arg:?}: {e}")))?;
                Self::Count(n)
            }
            "window" => Self::Window(parse_duration(arg.trim())?),
            other => {
                return Err(GeoError::config(format!(
                    "unknown step policy {other:?} (expected count or window)"
                )))
            }
        };
        policy.validate()?;
        Ok(policy)
    }
}

fn parse_duration(text: &str) -> GeoResult<Duration> {
    let (number, unit_secs) = match text.char_indices().last() {
        Some((i, 's')) => (&text[..i], 1.0),
        Some((i, 'm')) => (&text[..i], 60.0),
        Some((i, 'h')) => (&text[..i], 3600.0),
        _ => (text, 1.0),
    };
    let value = number
        .trim()
        .parse::<f64>()
        .map_err(|e| GeoError::config(format!("invalid duration {text:?}: {e}")))?;
    Duration::try_from_secs_f64(value * unit_secs)
        .map_err(|e| GeoError::config(format!("invalid duration {text:?}: {e}")))
}

/// Whether frames show everything so far or only the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationPolicy {
    /// Values never decay; each frame includes all earlier steps.
    Cumulative,
    /// The grid is cleared at each step boundary.
    #[default]
    Windowed,
}

impl AccumulationPolicy {
    /// True if the buffer is cleared before each step.
    pub fn resets_each_step(self) -> bool {
        matches!(self, Self::Windowed)
    }
}

impl fmt::Display for AccumulationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cumulative => f.write_str("cumulative"),
            Self::Windowed => f.write_str("windowed"),
        }
    }
}

impl FromStr for AccumulationPolicy {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cumulative" => Ok(Self::Cumulative),
            "windowed" => Ok(Self::Windowed),
            other => Err(GeoError::config(format!(
                "unknown accumulation policy {other:?} (expected cumulative or windowed)"
            ))),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| D::Error::custom(format!("invalid window {secs}: {e}")))
    }
}
