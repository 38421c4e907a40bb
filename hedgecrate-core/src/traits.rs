//! Service traits consumed by the retessellating finalizer

use crate::plane::Plane;
use crate::point::*;
use crate::Result;

/// Triangles covering a planar patch, as returned by a [`Tessellator`]
#[derive(Debug, Clone, Default)]
pub struct TessellatedPatch {
    pub vertices: Vec<Point3f>,
    pub normals: Vec<Vector3f>,
    pub colors: Vec<Rgb>,
    pub indices: Vec<[usize; 3]>,
}

impl TessellatedPatch {
    /// Check if the patch has no triangles
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// An RGB texture image
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    /// Row-major RGB texels
    pub data: Vec<u8>,
}

/// Affine map from points on a plane to texture coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvMapping {
    pub origin: Point3f,
    /// Scaled so that `(p - origin) · u_axis` spans `[0, 1]` over the texture
    pub u_axis: Vector3f,
    pub v_axis: Vector3f,
}

impl UvMapping {
    /// Texture coordinates of `point`
    pub fn tex_coords(&self, point: &Point3f) -> [f32; 2] {
        let d = point - self.origin;
        [d.dot(&self.u_axis), d.dot(&self.v_axis)]
    }
}

/// A texture together with the mapping of plane points into it
#[derive(Debug, Clone)]
pub struct TextureProjection {
    pub texture: Texture,
    pub mapping: UvMapping,
}

/// Polygon tessellation service.
///
/// Contours are closed polygons lying in `plane`; the first contour is the
/// outer boundary by convention but implementations must not rely on order.
pub trait Tessellator {
    /// Triangulate the area enclosed by `contours`
    fn tessellate(
        &self,
        contours: &[Vec<Point3f>],
        plane: &Plane,
        color: Rgb,
    ) -> Result<TessellatedPatch>;
}

/// Texture projection service for planar regions
pub trait TextureProjector {
    /// Create a texture for the region bounded by `contours` on `plane`
    fn project(
        &mut self,
        region_id: usize,
        plane: &Plane,
        contours: &[Vec<Point3f>],
        color: Rgb,
    ) -> Result<TextureProjection>;
}
