//! Subcommands and the arguments they share.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Args;

use geoprojector_common::{GeoResult, RenderDefaults};
use geoprojector_core::SequenceGenerator;
use geoprojector_model::{
    load_points, AccumulationPolicy, CenteredGrid, GeoCoord, GridLayout, LoadOptions, Point,
    PointFormat, RunConfig, StepPolicy,
};
use geoprojector_render::{Colormap, IntensityScale, RenderOptions};

pub mod animate;
pub mod init;
pub mod inspect;
pub mod validate;

/// Run config file plus per-field overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Run config (JSON); defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Fixed number of points per frame
    #[arg(long, conflicts_with = "window_secs")]
    pub count: Option<usize>,

    /// Frame window length in seconds
    #[arg(long)]
    pub window_secs: Option<u64>,

    /// cumulative | windowed
    #[arg(long)]
    pub accumulation: Option<AccumulationPolicy>,

    #[arg(long)]
    pub rows: Option<usize>,

    #[arg(long)]
    pub cols: Option<usize>,

    /// Cell edge in kilometres (centred grid)
    #[arg(long)]
    pub cell_km: Option<f64>,

    /// Grid centre latitude; the earliest point is used when omitted
    #[arg(long, requires = "center_lon", allow_negative_numbers = true)]
    pub center_lat: Option<f64>,

    #[arg(long, requires = "center_lat", allow_negative_numbers = true)]
    pub center_lon: Option<f64>,

    /// Input layout: jsonl | json | frames [default: detect]
    #[arg(long)]
    pub format: Option<PointFormat>,

    /// Seconds between frames in the frames layout [default: 60]
    #[arg(long)]
    pub frame_step_secs: Option<u64>,
}

impl RunArgs {
    /// Load the run config (or defaults) and apply command-line overrides.
    pub fn run_config(&self) -> GeoResult<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };

        if let Some(n) = self.count {
            config.step = StepPolicy::Count(n);
        }
        if let Some(secs) = self.window_secs {
            config.step = StepPolicy::Window(Duration::from_secs(secs));
        }
        if let Some(accumulation) = self.accumulation {
            config.accumulation = accumulation;
        }

        // Km and centre overrides only make sense for a centred grid.
        if self.cell_km.is_some() || self.center_lat.is_some() {
            if let GridLayout::Explicit(spec) = &config.grid {
                config.grid = GridLayout::Centered(CenteredGrid {
                    rows: spec.rows(),
                    cols: spec.cols(),
                    ..CenteredGrid::default()
                });
            }
        }

        match &mut config.grid {
            GridLayout::Explicit(spec) => {
                if let Some(rows) = self.rows {
                    spec.dimensions.rows = rows;
                }
                if let Some(cols) = self.cols {
                    spec.dimensions.cols = cols;
                }
            }
            GridLayout::Centered(grid) => {
                if let Some(rows) = self.rows {
                    grid.rows = rows;
                }
                if let Some(cols) = self.cols {
                    grid.cols = cols;
                }
                if let Some(km) = self.cell_km {
                    grid.cell_size_km = km;
                }
                if let (Some(lat), Some(lon)) = (self.center_lat, self.center_lon) {
                    grid.center = Some(GeoCoord::new(lat, lon));
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn load_options(&self) -> LoadOptions {
        let mut options = LoadOptions {
            format: self.format,
            ..LoadOptions::default()
        };
        if let Some(secs) = self.frame_step_secs {
            options.frame_step = Duration::from_secs(secs);
        }
        options
    }
}

/// Render overrides on top of the application config.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// jet | viridis | turbo | inferno
    #[arg(long)]
    pub colormap: Option<Colormap>,

    /// linear | log
    #[arg(long)]
    pub scale: Option<IntensityScale>,

    /// Cell edge in pixels
    #[arg(long)]
    pub cell_px: Option<u32>,

    /// Delay between GIF frames in milliseconds
    #[arg(long)]
    pub frame_delay_ms: Option<u32>,
}

impl RenderArgs {
    pub fn options(&self, defaults: &RenderDefaults) -> GeoResult<RenderOptions> {
        let options = RenderOptions {
            cell_px: self.cell_px.unwrap_or(defaults.cell_px),
            frame_delay_ms: self.frame_delay_ms.unwrap_or(defaults.frame_delay_ms),
            colormap: match self.colormap {
                Some(colormap) => colormap,
                None => defaults.colormap.parse()?,
            },
            scale: match self.scale {
                Some(scale) => scale,
                None => defaults.scale.parse()?,
            },
        };
        options.validate()?;
        Ok(options)
    }
}

/// Points, resolved config, and a generator ready to run.
pub struct Prepared {
    pub points: Vec<Point>,
    pub config: RunConfig,
    /// `None` when there are no points and the grid is centred on the
    /// earliest one: there is nothing to place the grid on, and nothing to
    /// project either.
    pub generator: Option<SequenceGenerator>,
}

pub fn prepare(points_path: &Path, args: &RunArgs) -> anyhow::Result<Prepared> {
    let config = args.run_config().context("Invalid run configuration")?;
    let points = load_points(points_path, &args.load_options())
        .with_context(|| format!("Failed to load points from {}", points_path.display()))?;

    let generator = if points.is_empty() && config.needs_points() {
        tracing::warn!(path = %points_path.display(), "No points; grid left unresolved");
        None
    } else {
        Some(
            SequenceGenerator::from_run_config(&config, &points)
                .context("Failed to resolve grid")?,
        )
    };

    Ok(Prepared {
        points,
        config,
        generator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoprojector_model::GridSpec;

    #[test]
    fn test_defaults_without_config_file() {
        let config = RunArgs::default().run_config().unwrap();
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn test_step_and_accumulation_overrides() {
        let args = RunArgs {
            count: Some(3),
            accumulation: Some(AccumulationPolicy::Cumulative),
            ..Default::default()
        };
        let config = args.run_config().unwrap();
        assert_eq!(config.step, StepPolicy::Count(3));
        assert_eq!(config.accumulation, AccumulationPolicy::Cumulative);

        let zero = RunArgs {
            count: Some(0),
            ..Default::default()
        };
        assert!(zero.run_config().is_err());
    }

    #[test]
    fn test_centre_override_on_centred_grid() {
        let args = RunArgs {
            center_lat: Some(38.5),
            center_lon: Some(-122.5),
            cell_km: Some(0.5),
            rows: Some(4),
            ..Default::default()
        };
        let config = args.run_config().unwrap();
        let GridLayout::Centered(grid) = config.grid else {
            panic!("expected centred grid");
        };
        assert_eq!(grid.center, Some(GeoCoord::new(38.5, -122.5)));
        assert_eq!(grid.cell_size_km, 0.5);
        assert_eq!((grid.rows, grid.cols), (4, 10));
    }

    #[test]
    fn test_dimension_override_on_explicit_grid() {
        let dir = std::env::temp_dir().join(format!("geoprojector-cli-args-{}", std::process::id()));
        let path = dir.join("run.json");
        RunConfig {
            grid: GridLayout::Explicit(GridSpec::from_parts(0.0, 0.0, 1.0, 1.0, 2, 2).unwrap()),
            ..RunConfig::default()
        }
        .save(&path)
        .unwrap();

        let args = RunArgs {
            config: Some(path.clone()),
            cols: Some(7),
            ..Default::default()
        };
        let config = args.run_config().unwrap();
        let GridLayout::Explicit(spec) = config.grid else {
            panic!("expected explicit grid");
        };
        assert_eq!((spec.rows(), spec.cols()), (2, 7));

        // A km override turns it into a centred grid of the same shape.
        let args = RunArgs {
            config: Some(path),
            cell_km: Some(1.0),
            ..Default::default()
        };
        let config = args.run_config().unwrap();
        assert!(matches!(
            config.grid,
            GridLayout::Centered(CenteredGrid { rows: 2, cols: 2, .. })
        ));

        let _ = std::fs::remove_dir_all(dir);
    }

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("geoprojector-cli-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("points.jsonl");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_empty_points_with_default_config() {
        let path = scratch_file("empty", "# no detections yet\n");

        let prepared = prepare(&path, &RunArgs::default()).unwrap();
        assert!(prepared.points.is_empty());
        assert!(prepared.generator.is_none());

        validate::run(path.clone(), &RunArgs::default()).unwrap();
        inspect::run(path.clone(), &RunArgs::default(), false).unwrap();
        inspect::run(path.clone(), &RunArgs::default(), true).unwrap();

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_empty_points_with_fixed_centre_yield_no_frames() {
        let path = scratch_file("empty-centred", "");
        let args = RunArgs {
            center_lat: Some(38.5),
            center_lon: Some(-122.5),
            ..Default::default()
        };

        let prepared = prepare(&path, &args).unwrap();
        let generator = prepared.generator.unwrap();
        assert_eq!(generator.generate(prepared.points).unwrap().len(), 0);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_zero_frame_step_is_rejected() {
        let dir = std::env::temp_dir().join(format!("geoprojector-cli-step-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frames.json");
        std::fs::write(&path, "[[[38.5, -122.5]], [[38.5, -122.5]]]").unwrap();

        let args = RunArgs {
            frame_step_secs: Some(0),
            ..Default::default()
        };
        assert!(prepare(&path, &args).is_err());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_render_overrides() {
        let defaults = RenderDefaults {
            colormap: "not-a-map".into(),
            ..Default::default()
        };
        assert!(RenderArgs::default().options(&defaults).is_err());

        let args = RenderArgs {
            colormap: Some(Colormap::Jet),
            cell_px: Some(5),
            ..Default::default()
        };
        let options = args.options(&defaults).unwrap();
        assert_eq!(options.colormap, Colormap::Jet);
        assert_eq!(options.cell_px, 5);
        assert_eq!(options.frame_delay_ms, 300);
    }
}
