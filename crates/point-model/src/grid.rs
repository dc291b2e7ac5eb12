//! Grid geometry.
//!
//! A [`GridSpec`] lays a regular lat/lon lattice over the map. The origin is
//! the south-west corner; row 0 is the southernmost row and column 0 the
//! westernmost column. Cells are half-open: a cell covers
//! `[origin + k * delta, origin + (k + 1) * delta)` on each axis.

use geoprojector_common::{GeoError, GeoResult};
use serde::{Deserialize, Serialize};

/// Kilometres per degree of latitude (small-distance approximation).
pub const KM_PER_DEG_LAT: f64 = 111.32;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    pub lat: f64,
    pub lon: f64,
}

impl GeoCoord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Size of one cell in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub lat_delta: f64,
    pub lon_delta: f64,
}

/// Grid shape in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub rows: usize,
    pub cols: usize,
}

/// Geographic bounds covered by a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// Placement and resolution of the projection grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// South-west corner.
    pub origin: GeoCoord,
    pub cell_size: CellSize,
    pub dimensions: Dimensions,
}

impl GridSpec {
    /// Create a validated grid.
    pub fn new(origin: GeoCoord, cell_size: CellSize, dimensions: Dimensions) -> GeoResult<Self> {
        let spec = Self {
            origin,
            cell_size,
            dimensions,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Shorthand for `new` with plain numbers: origin, cell deltas, then shape.
    pub fn from_parts(
        origin_lat: f64,
        origin_lon: f64,
        lat_delta: f64,
        lon_delta: f64,
        rows: usize,
        cols: usize,
    ) -> GeoResult<Self> {
        Self::new(
            GeoCoord::new(origin_lat, origin_lon),
            CellSize {
                lat_delta,
                lon_delta,
            },
            Dimensions { rows, cols },
        )
    }

    /// Build a grid of `cell_size_km` cells centred on `center`.
    ///
    /// Degrees per km use the equirectangular approximation at the centre
    /// latitude. The centre lands in cell `(rows / 2, cols / 2)`.
    pub fn centered_km(
        center: GeoCoord,
        cell_size_km: f64,
        rows: usize,
        cols: usize,
    ) -> GeoResult<Self> {
        if !cell_size_km.is_finite() || cell_size_km <= 0.0 {
            return Err(GeoError::config(format!(
                "cell size must be a positive number of km, got {cell_size_km}"
            )));
        }
        if !center.lat.is_finite() || center.lat.abs() >= 90.0 {
            return Err(GeoError::config(format!(
                "cannot centre a km grid at latitude {}",
                center.lat
            )));
        }

        let lat_delta = cell_size_km / KM_PER_DEG_LAT;
        let lon_delta = cell_size_km / (KM_PER_DEG_LAT * center.lat.to_radians().cos());

        let origin = GeoCoord::new(
            center.lat - ((rows / 2) as f64 + 0.5) * lat_delta,
            center.lon - ((cols / 2) as f64 + 0.5) * lon_delta,
        );

        Self::new(
            origin,
            CellSize {
                lat_delta,
                lon_delta,
            },
            Dimensions { rows, cols },
        )
    }

    /// Check that the cell size is positive and the grid has at least one cell.
    pub fn validate(&self) -> GeoResult<()> {
        if !self.origin.lat.is_finite() || !self.origin.lon.is_finite() {
            return Err(GeoError::config(format!(
                "grid origin ({}, {}) is not finite",
                self.origin.lat, self.origin.lon
            )));
        }
        let CellSize {
            lat_delta,
            lon_delta,
        } = self.cell_size;
        if !lat_delta.is_finite() || lat_delta <= 0.0 {
            return Err(GeoError::config(format!(
                "lat_delta must be positive, got {lat_delta}"
            )));
        }
        if !lon_delta.is_finite() || lon_delta <= 0.0 {
            return Err(GeoError::config(format!(
                "lon_delta must be positive, got {lon_delta}"
            )));
        }
        if self.dimensions.rows == 0 || self.dimensions.cols == 0 {
            return Err(GeoError::config(format!(
                "grid dimensions must be at least 1x1, got {}x{}",
                self.dimensions.rows, self.dimensions.cols
            )));
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.dimensions.rows
    }

    pub fn cols(&self) -> usize {
        self.dimensions.cols
    }

    pub fn cell_count(&self) -> usize {
        self.dimensions.rows * self.dimensions.cols
    }

    /// Geographic bounds of the whole grid.
    pub fn extent(&self) -> Extent {
        Extent {
            south: self.origin.lat,
            west: self.origin.lon,
            north: self.origin.lat + self.dimensions.rows as f64 * self.cell_size.lat_delta,
            east: self.origin.lon + self.dimensions.cols as f64 * self.cell_size.lon_delta,
        }
    }

    /// Centre of cell `(row, col)`, or `None` outside the grid.
    pub fn cell_center(&self, row: usize, col: usize) -> Option<GeoCoord> {
        if row >= self.dimensions.rows || col >= self.dimensions.cols {
            return None;
        }
        Some(GeoCoord::new(
            self.origin.lat + (row as f64 + 0.5) * self.cell_size.lat_delta,
            self.origin.lon + (col as f64 + 0.5) * self.cell_size.lon_delta,
        ))
    }
}
