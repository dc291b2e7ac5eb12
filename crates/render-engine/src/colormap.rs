//! Colormaps and intensity scaling.

use std::fmt;
use std::str::FromStr;

use geoprojector_common::GeoError;

/// Available colormaps for frame rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Colormap {
    /// Blue -> Cyan -> Yellow -> Red
    Jet,
    /// Purple -> Blue -> Green -> Yellow
    Viridis,
    /// Blue -> Cyan -> Green -> Yellow -> Orange -> Red
    #[default]
    Turbo,
    /// Black -> Purple -> Orange -> Pale yellow
    Inferno,
}

const JET: &[[f64; 3]] = &[
    [0.0, 0.0, 0.5],
    [0.0, 0.0, 1.0],
    [0.0, 1.0, 1.0],
    [1.0, 1.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.5, 0.0, 0.0],
];

const VIRIDIS: &[[f64; 3]] = &[
    [0.267004, 0.004874, 0.329415],
    [0.282623, 0.140926, 0.457517],
    [0.163625, 0.471133, 0.558148],
    [0.477504, 0.821444, 0.318195],
    [0.993248, 0.906157, 0.143936],
];

const TURBO: &[[f64; 3]] = &[
    [0.18995, 0.07176, 0.23217],
    [0.11770, 0.56700, 0.75088],
    [0.17205, 0.88797, 0.54362],
    [0.89567, 0.99343, 0.29685],
    [0.97809, 0.55414, 0.10540],
    [0.78801, 0.08080, 0.06051],
];

const INFERNO: &[[f64; 3]] = &[
    [0.001462, 0.000466, 0.013866],
    [0.258234, 0.038571, 0.406485],
    [0.578304, 0.148039, 0.404411],
    [0.865006, 0.316822, 0.226055],
    [0.987622, 0.645320, 0.039886],
    [0.988362, 0.998364, 0.644924],
];

impl Colormap {
    pub const ALL: [Colormap; 4] = [Self::Jet, Self::Viridis, Self::Turbo, Self::Inferno];

    fn control_points(self) -> &'static [[f64; 3]] {
        match self {
            Self::Jet => JET,
            Self::Viridis => VIRIDIS,
            Self::Turbo => TURBO,
            Self::Inferno => INFERNO,
        }
    }

    /// Map a normalized value in `[0, 1]` to an RGB triple. Out-of-range input is clamped.
    pub fn rgb(self, value: f64) -> [u8; 3] {
        let points = self.control_points();
        let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };

        let pos = v * (points.len() - 1) as f64;
        let i = (pos.floor() as usize).min(points.len() - 2);
        let t = pos - i as f64;

        let (a, b) = (points[i], points[i + 1]);
        let channel = |k: usize| ((a[k] + t * (b[k] - a[k])) * 255.0).round() as u8;
        [channel(0), channel(1), channel(2)]
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jet => "jet",
            Self::Viridis => "viridis",
            Self::Turbo => "turbo",
            Self::Inferno => "inferno",
        })
    }
}

impl FromStr for Colormap {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jet" => Ok(Self::Jet),
            "viridis" => Ok(Self::Viridis),
            "turbo" => Ok(Self::Turbo),
            "inferno" => Ok(Self::Inferno),
            other => Err(GeoError::config(format!(
                "unknown colormap {other:?} (expected jet, viridis, turbo, or inferno)"
            ))),
        }
    }
}

/// How cell values are normalized before color lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IntensityScale {
    #[default]
    Linear,
    /// `ln(1 + v) / ln(1 + max)`; keeps a few hot cells from washing out the rest.
    Log,
}

impl IntensityScale {
    /// Normalize `value` against `max` into `[0, 1]`.
    pub fn normalize(self, value: f64, max: f64) -> f64 {
        if value.is_nan() || max.is_nan() || value <= 0.0 || max <= 0.0 {
            return 0.0;
        }
        let n = match self {
            Self::Linear => value / max,
            Self::Log => value.ln_1p() / max.ln_1p(),
        };
        n.clamp(0.0, 1.0)
    }
}

impl fmt::Display for IntensityScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Linear => "linear",
            Self::Log => "log",
        })
    }
}

impl FromStr for IntensityScale {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "log" => Ok(Self::Log),
            other => Err(GeoError::config(format!(
                "unknown intensity scale {other:?} (expected linear or log)"
            ))),
        }
    }
}
