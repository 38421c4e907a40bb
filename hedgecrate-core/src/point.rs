//! Point types and related functionality

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use bytemuck::{Pod, Zeroable};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// An 8-bit RGB colour
pub type Rgb = [u8; 3];

/// A point with normal vector, as delivered by the reconstruction stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct NormalPoint3f {
    pub position: Point3f,
    pub normal: Vector3f,
}

unsafe impl Pod for NormalPoint3f {}
unsafe impl Zeroable for NormalPoint3f {}

impl NormalPoint3f {
    /// Create a point from a position and a normal
    pub fn new(position: Point3f, normal: Vector3f) -> Self {
        Self { position, normal }
    }
}

impl Default for NormalPoint3f {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            normal: Vector3f::new(0.0, 0.0, 1.0),
        }
    }
}

/// Midpoint of two points
pub fn midpoint(a: &Point3f, b: &Point3f) -> Point3f {
    Point3f::from((a.coords + b.coords) * 0.5)
}

/// Unit normal of the triangle `(a, b, c)` following its winding, or `None`
/// when the triangle is degenerate.
pub fn triangle_normal(a: &Point3f, b: &Point3f, c: &Point3f) -> Option<Vector3f> {
    let n = (b - a).cross(&(c - a));
    n.try_normalize(f32::EPSILON)
}
