//! Run configuration: grid layout plus step and accumulation policies.
//!
//! Stored as JSON, for example:
//!
//! ```json
//! {
//!   "grid": {"centered": {"center": null, "cell_size_km": 0.2, "rows": 10, "cols": 10}},
//!   "step": {"window_secs": 60.0},
//!   "accumulation": "windowed"
//! }
//! ```

use std::path::Path;

use geoprojector_common::{GeoError, GeoResult};
use serde::{Deserialize, Serialize};

use crate::grid::{GeoCoord, GridSpec};
use crate::point::Point;
use crate::policy::{AccumulationPolicy, StepPolicy};

/// Everything the sequence generator needs besides the points themselves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub grid: GridLayout,
    pub step: StepPolicy,
    pub accumulation: AccumulationPolicy,
}

/// How the projection grid is placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridLayout {
    /// A fully specified grid.
    Explicit(GridSpec),
    /// A square-km grid centred on a point.
    Centered(CenteredGrid),
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::Centered(CenteredGrid::default())
    }
}

/// Parameters for [`GridSpec::centered_km`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenteredGrid {
    /// Grid centre. `None` centres on the earliest point.
    pub center: Option<GeoCoord>,
    pub cell_size_km: f64,
    pub rows: usize,
    pub cols: usize,
}

impl Default for CenteredGrid {
    fn default() -> Self {
        Self {
            center: None,
            cell_size_km: 0.2,
            rows: 10,
            cols: 10,
        }
    }
}

impl RunConfig {
    /// Load a run config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> GeoResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GeoError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), step = %config.step, accumulation = %config.accumulation, "Loaded run config");
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> GeoResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check every part that can be checked without points.
    pub fn validate(&self) -> GeoResult<()> {
        self.step.validate()?;
        match &self.grid {
            GridLayout::Explicit(spec) => spec.validate(),
            GridLayout::Centered(c) => {
                if !c.cell_size_km.is_finite() || c.cell_size_km <= 0.0 {
                    return Err(GeoError::config(format!(
                        "cell_size_km must be positive, got {}",
                        c.cell_size_km
                    )));
                }
                if c.rows == 0 || c.cols == 0 {
                    return Err(GeoError::config(format!(
                        "grid dimensions must be at least 1x1, got {}x{}",
                        c.rows, c.cols
                    )));
                }
                Ok(())
            }
        }
    }

    /// True when the grid can only be placed once points are known: a centred
    /// layout without an explicit centre.
    pub fn needs_points(&self) -> bool {
        matches!(
            self.grid,
            GridLayout::Centered(CenteredGrid { center: None, .. })
        )
    }

    /// Produce the concrete grid for this run.
    ///
    /// A centred layout without an explicit centre uses the earliest point;
    /// ties go to the first such point in input order.
    pub fn resolve_grid(&self, points: &[Point]) -> GeoResult<GridSpec> {
        match &self.grid {
            GridLayout::Explicit(spec) => {
                spec.validate()?;
                Ok(*spec)
            }
            GridLayout::Centered(c) => {
                let center = match c.center {
                    Some(center) => center,
                    None => points
                        .iter()
                        .min_by_key(|p| p.timestamp)
                        .map(|p| GeoCoord::new(p.latitude, p.longitude))
                        .ok_or_else(|| {
                            GeoError::config("grid has no centre and there are no points")
                        })?,
                };
                GridSpec::centered_km(center, c.cell_size_km, c.rows, c.cols)
            }
        }
    }
}
