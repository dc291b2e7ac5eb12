//! Geoprojector Data Model
//!
//! Defines the data contracts shared by the projection core, the renderer,
//! and the CLI:
//! - **Points:** Timestamped geographic observations with optional weights
//! - **Grid:** Placement and resolution of the projection lattice
//! - **Policies:** Step partitioning and accumulation behaviour
//! - **Run config:** The JSON document that bundles the above
//! - **Loader:** Reading points from JSONL, JSON array, or frame-grouped files
//!
//! Coordinates are plain WGS84 degrees. The only projection ever applied is
//! a linear lat/lon mapping.

pub mod grid;
pub mod loader;
pub mod point;
pub mod policy;
pub mod run;

pub use grid::*;
pub use loader::*;
pub use point::*;
pub use policy::*;
pub use run::*;
