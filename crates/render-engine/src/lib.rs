//! Geoprojector Render Engine
//!
//! Turns a [`FrameSequence`](geoprojector_core::FrameSequence) into something
//! a person can look at.
//!
//! ```text
//! FrameSequence ──┬── raster (plotters) ──┬── animation.gif
//!                 │                       └── frame_0000.png ...
//!                 └── text ───────────────── console grid
//! ```
//!
//! All image outputs share one normalization ceiling (the sequence-wide
//! maximum), so a color means the same value in every frame.

pub mod colormap;
pub mod export;
pub mod raster;
pub mod text;

pub use colormap::{Colormap, IntensityScale};
pub use export::{
    export_sequence, png_frame_name, render_gif, render_png_frames, ExportFormat, ExportJob,
};
pub use raster::{paint_snapshot, RenderOptions};
pub use text::{render_sequence_text, render_text, render_text_with};
