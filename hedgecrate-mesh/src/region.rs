//! Planar regions and regression-plane fitting

use hedgecrate_core::{Matrix3, Plane, Point3f, Vector3f};

use crate::handle::{FaceHandle, HandleSet, RegionId, VertexHandle};
use crate::HalfEdgeMesh;

/// A connected set of faces sharing approximately one normal direction
#[derive(Debug, Clone)]
pub struct Region {
    pub id: RegionId,
    pub faces: Vec<FaceHandle>,
    /// Fitted plane, present once the region is in-plane
    pub plane: Option<Plane>,
}

impl Region {
    /// Create an empty region
    pub fn new(id: RegionId) -> Self {
        Self {
            id,
            faces: Vec::new(),
            plane: None,
        }
    }

    /// Number of member faces
    pub fn size(&self) -> usize {
        self.faces.len()
    }

    /// Check if the region has been fitted to a plane
    pub fn is_in_plane(&self) -> bool {
        self.plane.is_some()
    }

    /// Normal of the fitted plane
    pub fn normal(&self) -> Option<Vector3f> {
        self.plane.map(|p| p.normal)
    }

    /// Check whether a member face with the given normal flickers: an
    /// in-plane region renders it facing away from the plane.
    pub fn detect_flicker(&self, face_normal: &Vector3f) -> bool {
        match &self.plane {
            Some(plane) => face_normal.dot(&plane.normal) < 0.0,
            None => false,
        }
    }

    /// Distinct vertices of all member faces, in first-seen order
    pub fn vertices(&self, mesh: &HalfEdgeMesh) -> Vec<VertexHandle> {
        let mut seen = HandleSet::new();
        let mut result = Vec::new();
        for &f in &self.faces {
            if mesh.face(f).is_none() {
                continue;
            }
            for v in mesh.face_vertices(f) {
                if seen.insert(v) {
                    result.push(v);
                }
            }
        }
        result
    }
}

/// Least-squares plane through the vertices of `faces`.
///
/// The normal is the eigenvector of the smallest eigenvalue of the vertex
/// covariance, oriented to agree with the mean face normal. Returns `None`
/// for fewer than three distinct vertices.
pub fn regression_plane(mesh: &HalfEdgeMesh, faces: &[FaceHandle]) -> Option<Plane> {
    let mut seen = HandleSet::new();
    let mut points: Vec<Point3f> = Vec::new();
    let mut mean_normal = Vector3f::zeros();

    for &f in faces {
        let Some(face) = mesh.face(f) else {
            continue;
        };
        mean_normal += face.normal;
        for v in mesh.face_vertices(f) {
            if seen.insert(v) {
                points.push(mesh.vertices[v].position);
            }
        }
    }
    if points.len() < 3 {
        return None;
    }

    // Compute centroid
    let mut centroid = Point3f::origin();
    for point in &points {
        centroid = Point3f::from(centroid.coords + point.coords);
    }
    centroid = Point3f::from(centroid.coords / points.len() as f32);

    // Compute covariance matrix
    let mut covariance = Matrix3::zeros();
    for point in &points {
        let diff = point - centroid;
        covariance += diff * diff.transpose();
    }

    let eigen = covariance.symmetric_eigen();
    let smallest = eigen.eigenvalues.imin();
    let mut normal: Vector3f = eigen.eigenvectors.column(smallest).clone_owned();

    if normal.dot(&mean_normal) < 0.0 {
        normal = -normal;
    }
    Plane::new(normal, centroid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_regression_plane_of_flat_grid() {
        let mesh = make_plane_grid(4);
        let faces: Vec<FaceHandle> = mesh.face_handles().collect();
        let plane = regression_plane(&mesh, &faces).unwrap();

        // Grid faces are wound towards -Z
        assert_relative_eq!(plane.normal.z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(plane.support.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(plane.support.x, 1.5, epsilon = 1e-5);
    }

    #[test]
    fn test_regression_plane_needs_three_points() {
        let mesh = HalfEdgeMesh::new();
        assert!(regression_plane(&mesh, &[]).is_none());
    }

    #[test]
    fn test_flicker_against_plane_normal() {
        let mut region = Region::new(RegionId(0));
        assert!(!region.detect_flicker(&-Vector3f::z()));

        region.plane = Plane::new(Vector3f::z(), Point3f::origin());
        assert!(region.is_in_plane());
        assert!(region.detect_flicker(&-Vector3f::z()));
        assert!(!region.detect_flicker(&Vector3f::new(0.1, 0.0, 0.9)));
    }

    #[test]
    fn test_region_vertices_are_distinct() {
        let mesh = make_two_triangles();
        let mut region = Region::new(RegionId(0));
        region.faces = mesh.face_handles().collect();
        assert_eq!(region.vertices(&mesh).len(), 4);
        assert_eq!(region.size(), 2);
    }
}
