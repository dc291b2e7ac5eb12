//! Rasterization of grid snapshots onto a plotters drawing area.
//!
//! Row 0 is the southern edge of the grid, so rows are flipped on the way
//! out: the last row lands at the top of the image.

use plotters::coord::Shift;
use plotters::prelude::*;

use geoprojector_common::{GeoError, GeoResult, RenderDefaults};
use geoprojector_core::GridSnapshot;

use crate::colormap::{Colormap, IntensityScale};

/// Options shared by every image output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Edge length of one cell in pixels.
    pub cell_px: u32,

    /// Delay between animation frames in milliseconds.
    pub frame_delay_ms: u32,

    pub colormap: Colormap,

    pub scale: IntensityScale,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cell_px: 24,
            frame_delay_ms: 300,
            colormap: Colormap::default(),
            scale: IntensityScale::default(),
        }
    }
}

impl RenderOptions {
    /// Build options from the application-level render defaults.
    pub fn from_defaults(defaults: &RenderDefaults) -> GeoResult<Self> {
        let options = Self {
            cell_px: defaults.cell_px,
            frame_delay_ms: defaults.frame_delay_ms,
            colormap: defaults.colormap.parse()?,
            scale: defaults.scale.parse()?,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> GeoResult<()> {
        if self.cell_px == 0 {
            return Err(GeoError::config("cell_px must be >= 1"));
        }
        Ok(())
    }

    /// Pixel size of a `rows x cols` grid image.
    pub fn image_size(&self, rows: usize, cols: usize) -> GeoResult<(u32, u32)> {
        self.validate()?;
        let side = |cells: usize| -> GeoResult<u32> {
            u32::try_from(cells)
                .ok()
                .and_then(|n| n.checked_mul(self.cell_px))
                .filter(|&px| px > 0 && px <= i32::MAX as u32)
                .ok_or_else(|| {
                    GeoError::render(format!(
                        "{cells} cells at {}px does not fit in an image",
                        self.cell_px
                    ))
                })
        };
        Ok((side(cols)?, side(rows)?))
    }

    /// RGB color of a cell value, or `None` for empty cells (left as background).
    pub fn cell_color(&self, value: f64, max: f64) -> Option<RGBColor> {
        if value.is_nan() || value <= 0.0 {
            return None;
        }
        let [r, g, b] = self.colormap.rgb(self.scale.normalize(value, max));
        Some(RGBColor(r, g, b))
    }
}

pub(crate) fn render_err(e: impl std::fmt::Display) -> GeoError {
    GeoError::render(e.to_string())
}

/// Paint one snapshot over the whole drawing area.
///
/// `max` is the normalization ceiling; callers pass the sequence-wide maximum
/// so colors stay comparable across frames.
pub fn paint_snapshot<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    snapshot: &GridSnapshot,
    max: f64,
    options: &RenderOptions,
) -> GeoResult<()> {
    area.fill(&BLACK).map_err(render_err)?;

    let rows = snapshot.rows();
    let px = options.cell_px as i32;
    for (i, &value) in snapshot.cells().iter().enumerate() {
        let Some(color) = options.cell_color(value, max) else {
            continue;
        };
        let (row, col) = (i / snapshot.cols(), i % snapshot.cols());
        let x0 = col as i32 * px;
        let y0 = (rows - 1 - row) as i32 * px;
        area.draw(&Rectangle::new(
            [(x0, y0), (x0 + px - 1, y0 + px - 1)],
            color.filled(),
        ))
        .map_err(render_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoprojector_core::GridBuffer;

    fn pixel(buf: &[u8], width: u32, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * width + x) * 3) as usize;
        [buf[i], buf[i + 1], buf[i + 2]]
    }

    #[test]
    fn test_image_size() {
        let options = RenderOptions {
            cell_px: 10,
            ..Default::default()
        };
        assert_eq!(options.image_size(3, 5).unwrap(), (50, 30));

        let zero = RenderOptions {
            cell_px: 0,
            ..Default::default()
        };
        assert!(zero.image_size(3, 5).is_err());
        assert!(options.image_size(usize::MAX, 5).is_err());
    }

    #[test]
    fn test_from_defaults() {
        let options = RenderOptions::from_defaults(&RenderDefaults::default()).unwrap();
        assert_eq!(options, RenderOptions::default());

        let bad = RenderDefaults {
            colormap: "sepia".into(),
            ..Default::default()
        };
        assert!(RenderOptions::from_defaults(&bad).is_err());
    }

    #[test]
    fn test_paint_puts_row_zero_at_the_bottom() {
        let mut buffer = GridBuffer::new(2, 2);
        buffer.accumulate(0, 0, 1.0).unwrap();
        buffer.accumulate(1, 1, 2.0).unwrap();
        let snapshot = buffer.snapshot();

        let options = RenderOptions {
            cell_px: 4,
            colormap: Colormap::Jet,
            ..Default::default()
        };
        let (w, h) = options.image_size(2, 2).unwrap();
        let mut buf = vec![0u8; (w * h * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
            paint_snapshot(&root, &snapshot, 2.0, &options).unwrap();
            root.present().unwrap();
        }

        // (1, 1) at full intensity: top-right.
        assert_eq!(pixel(&buf, w, 6, 1), Colormap::Jet.rgb(1.0));
        // (0, 0) at half intensity: bottom-left.
        assert_eq!(pixel(&buf, w, 1, 6), Colormap::Jet.rgb(0.5));
        // Empty cells stay black.
        assert_eq!(pixel(&buf, w, 1, 1), [0, 0, 0]);
        assert_eq!(pixel(&buf, w, 6, 6), [0, 0, 0]);
    }

    #[test]
    fn test_empty_cells_have_no_color() {
        let options = RenderOptions::default();
        assert!(options.cell_color(0.0, 5.0).is_none());
        assert!(options.cell_color(f64::NAN, 5.0).is_none());
        assert!(options.cell_color(0.1, 5.0).is_some());
    }
}
