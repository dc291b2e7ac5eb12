//! Geoprojector Processing Core
//!
//! Turns time-ordered point observations into grid frames:
//! - **Projector:** Linear lat/lon to `(row, col)` mapping; outside points are dropped
//! - **Grid Buffer:** Mutable accumulation grid with copy-out snapshots
//! - **Sequence:** Step partitioning and per-step accumulation, yielding one snapshot per step
//!
//! This crate is pure computation: no I/O, single-threaded, synchronous.
//! All inputs are data; all outputs are data.

pub mod buffer;
pub mod projector;
pub mod sequence;

pub use buffer::{FrameMeta, GridBuffer, GridSnapshot};
pub use projector::{project, project_coord};
pub use sequence::{generate, FrameSequence, IngestStats, SequenceGenerator, SnapshotSequence};
