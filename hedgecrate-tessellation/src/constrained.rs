//! Constrained Delaunay tessellation of planar outlines

use hedgecrate_core::{Error, Plane, Point3f, Result, Rgb, TessellatedPatch, Tessellator};
use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation};
use tracing::debug;

/// Configuration for constrained tessellation
#[derive(Debug, Clone)]
pub struct TessellationConfig {
    /// Triangles with a smaller area in plane units are dropped
    pub min_triangle_area: f64,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            min_triangle_area: 1e-10,
        }
    }
}

/// Tessellates planar outlines with a constrained Delaunay triangulation.
///
/// Every contour edge becomes a constraint; a triangle is kept when its
/// centroid lies inside the outlines by the even-odd rule, so inner
/// contours punch holes regardless of their orientation.
#[derive(Debug, Clone, Default)]
pub struct ConstrainedTessellator {
    config: TessellationConfig,
}

impl ConstrainedTessellator {
    pub fn new(config: TessellationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TessellationConfig {
        &self.config
    }
}

/// Even-odd point in polygon test over all rings
pub fn contains_even_odd(rings: &[Vec<Point2<f64>>], p: Point2<f64>) -> bool {
    let mut inside = false;
    for ring in rings {
        let n = ring.len();
        for i in 0..n {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
    }
    inside
}

fn signed_area(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
}

impl Tessellator for ConstrainedTessellator {
    fn tessellate(
        &self,
        contours: &[Vec<Point3f>],
        plane: &Plane,
        color: Rgb,
    ) -> Result<TessellatedPatch> {
        let rings: Vec<Vec<Point2<f64>>> = contours
            .iter()
            .filter(|c| c.len() >= 3)
            .map(|c| {
                c.iter()
                    .map(|p| {
                        let [x, y] = plane.to_local(p);
                        Point2::new(x, y)
                    })
                    .collect()
            })
            .collect();
        if rings.is_empty() {
            return Err(Error::InvalidData("Need at least one contour with 3 points".to_string()));
        }

        let mut cdt: ConstrainedDelaunayTriangulation<Point2<f64>> =
            ConstrainedDelaunayTriangulation::new();
        for ring in &rings {
            let handles = ring
                .iter()
                .map(|p| {
                    cdt.insert(*p).map_err(|e| {
                        Error::Tessellation(format!("Failed to insert contour point: {:?}", e))
                    })
                })
                .collect::<Result<Vec<FixedVertexHandle>>>()?;

            for k in 0..handles.len() {
                let (from, to) = (handles[k], handles[(k + 1) % handles.len()]);
                if from == to {
                    continue;
                }
                if !cdt.can_add_constraint(from, to) {
                    return Err(Error::Tessellation("Contour intersects itself".to_string()));
                }
                cdt.add_constraint(from, to);
            }
        }

        let mut indices = Vec::new();
        for face in cdt.inner_faces() {
            let corners = face.vertices();
            let [a, b, c] = corners.map(|v| v.position());
            if signed_area(a, b, c).abs() < self.config.min_triangle_area {
                continue;
            }
            let centroid = Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);
            if contains_even_odd(&rings, centroid) {
                indices.push(corners.map(|v| v.fix().index()));
            }
        }

        let vertices: Vec<Point3f> = cdt
            .vertices()
            .map(|v| {
                let p = v.position();
                plane.from_local([p.x, p.y])
            })
            .collect();
        debug!(
            contours = rings.len(),
            vertices = vertices.len(),
            triangles = indices.len(),
            "Tessellated outline"
        );

        let n = vertices.len();
        Ok(TessellatedPatch {
            vertices,
            normals: vec![plane.normal; n],
            colors: vec![color; n],
            indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedgecrate_core::Vector3f;

    fn square(min: f32, max: f32) -> Vec<Point3f> {
        vec![
            Point3f::new(min, min, 0.0),
            Point3f::new(max, min, 0.0),
            Point3f::new(max, max, 0.0),
            Point3f::new(min, max, 0.0),
        ]
    }

    fn patch_area(patch: &TessellatedPatch) -> f32 {
        patch
            .indices
            .iter()
            .map(|t| {
                let (a, b, c) = (patch.vertices[t[0]], patch.vertices[t[1]], patch.vertices[t[2]]);
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }

    #[test]
    fn test_even_odd_containment() {
        let outer = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ];
        let inner = vec![
            Point2::new(1.0, 1.0),
            Point2::new(3.0, 1.0),
            Point2::new(3.0, 3.0),
            Point2::new(1.0, 3.0),
        ];
        let rings = vec![outer, inner];
        assert!(contains_even_odd(&rings, Point2::new(0.5, 0.5)));
        assert!(!contains_even_odd(&rings, Point2::new(2.0, 2.0)));
        assert!(!contains_even_odd(&rings, Point2::new(5.0, 2.0)));
    }

    #[test]
    fn test_tessellate_square() {
        let plane = Plane::new(Vector3f::z(), Point3f::origin()).unwrap();
        let patch = ConstrainedTessellator::default()
            .tessellate(&[square(0.0, 2.0)], &plane, [10, 20, 30])
            .unwrap();

        assert_eq!(patch.vertices.len(), 4);
        assert_eq!(patch.indices.len(), 2);
        assert!((patch_area(&patch) - 4.0).abs() < 1e-4);
        assert!(patch.colors.iter().all(|&c| c == [10, 20, 30]));
        assert!(patch.vertices.iter().all(|p| p.z.abs() < 1e-5));
    }

    #[test]
    fn test_tessellate_square_with_hole() {
        let plane = Plane::new(Vector3f::z(), Point3f::origin()).unwrap();
        let patch = ConstrainedTessellator::default()
            .tessellate(&[square(0.0, 4.0), square(1.0, 3.0)], &plane, [0, 0, 0])
            .unwrap();

        assert_eq!(patch.vertices.len(), 8);
        assert_eq!(patch.indices.len(), 8);
        assert!((patch_area(&patch) - 12.0).abs() < 1e-3);
    }

    #[test]
    fn test_triangles_follow_plane_normal() {
        let plane = Plane::new(-Vector3f::z(), Point3f::origin()).unwrap();
        let patch = ConstrainedTessellator::default()
            .tessellate(&[square(0.0, 1.0)], &plane, [0, 0, 0])
            .unwrap();

        for t in &patch.indices {
            let (a, b, c) = (patch.vertices[t[0]], patch.vertices[t[1]], patch.vertices[t[2]]);
            assert!((b - a).cross(&(c - a)).z < 0.0);
        }
    }

    #[test]
    fn test_degenerate_contour_is_rejected() {
        let plane = Plane::new(Vector3f::z(), Point3f::origin()).unwrap();
        let line = vec![Point3f::origin(), Point3f::new(1.0, 0.0, 0.0)];
        assert!(ConstrainedTessellator::default()
            .tessellate(&[line], &plane, [0, 0, 0])
            .is_err());
    }
}
