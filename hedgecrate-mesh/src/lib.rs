//! Half-edge triangle mesh engine
//!
//! This crate holds reconstructed triangle meshes in a half-edge structure
//! and provides the passes that turn them into clean, compact output:
//! - Topology operators (edge collapse, edge flip, guarded collapse)
//! - Planar segmentation with regression planes and crease snapping
//! - Hole detection and filling, contour cleanup, artifact removal
//! - Finalization into flat buffers, optionally retessellating planar regions
//!
//! Entities live in arenas and refer to each other through stable handles,
//! so deleting one never leaves another pointing at freed memory.

pub mod cleanup;
pub mod finalize;
pub mod handle;
pub mod holes;
pub mod mesh;
pub mod operators;
pub mod pipeline;
pub mod region;
pub mod segmentation;

#[cfg(test)]
mod fixtures;

pub use finalize::{region_color, DEFAULT_COLOR};
pub use handle::*;
pub use mesh::*;
pub use pipeline::*;
pub use region::*;
pub use segmentation::{SegmentationStats, NORMAL_EPSILON};
