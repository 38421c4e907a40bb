//! # Hedgecrate Tessellation
//!
//! Default implementations of the planar services used when retessellating
//! segmented meshes:
//! - [`ConstrainedTessellator`] triangulates region outlines with a
//!   constrained Delaunay triangulation, honouring holes
//! - [`PlanarTextureProjector`] maps a region onto a flat texture in the
//!   plane basis

pub mod constrained;
pub mod texture;

pub use constrained::*;
pub use texture::*;
