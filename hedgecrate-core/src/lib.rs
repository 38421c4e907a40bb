//! Core data structures and traits for hedgecrate
//!
//! This crate provides the value types shared by the half-edge engine and its
//! collaborators: points, planes, indexed meshes, flat output buffers, the
//! tessellation/texture service traits and the common error type.

pub mod point;
pub mod plane;
pub mod mesh;
pub mod buffer;
pub mod traits;
pub mod error;

pub use point::*;
pub use plane::*;
pub use mesh::*;
pub use buffer::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3};
