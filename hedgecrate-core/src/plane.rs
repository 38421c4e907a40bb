//! Planes and lines used by plane fitting and intersection snapping

use crate::point::*;
use serde::{Deserialize, Serialize};

/// A plane given by a unit normal and a point lying on it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3f,
    pub support: Point3f,
}

/// An infinite line given by a point and a unit direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    pub point: Point3f,
    pub direction: Vector3f,
}

impl Plane {
    /// Create a plane, normalizing `normal`. Returns `None` for a zero normal.
    pub fn new(normal: Vector3f, support: Point3f) -> Option<Self> {
        let normal = normal.try_normalize(1e-12)?;
        Some(Self { normal, support })
    }

    /// The constant `d` of the plane equation `n · x = d`
    pub fn offset(&self) -> f32 {
        self.normal.dot(&self.support.coords)
    }

    /// Signed distance of `point` to the plane, positive on the normal side
    pub fn signed_distance(&self, point: &Point3f) -> f32 {
        self.normal.dot(&(point - self.support))
    }

    /// Orthogonal projection of `point` onto the plane
    pub fn project_point(&self, point: &Point3f) -> Point3f {
        point - self.normal * self.signed_distance(point)
    }

    /// Two unit vectors spanning the plane, forming a right-handed frame
    /// `(u, v, normal)`.
    pub fn basis(&self) -> (Vector3f, Vector3f) {
        let helper = if self.normal.x.abs() < 0.9 {
            Vector3f::x()
        } else {
            Vector3f::y()
        };
        let u = helper.cross(&self.normal).normalize();
        let v = self.normal.cross(&u);
        (u, v)
    }

    /// In-plane 2D coordinates of `point` relative to the support point
    pub fn to_local(&self, point: &Point3f) -> [f64; 2] {
        let (u, v) = self.basis();
        let d = point - self.support;
        [d.dot(&u) as f64, d.dot(&v) as f64]
    }

    /// Point on the plane with the given in-plane coordinates; inverse of
    /// [`to_local`](Self::to_local)
    pub fn from_local(&self, local: [f64; 2]) -> Point3f {
        let (u, v) = self.basis();
        self.support + u * local[0] as f32 + v * local[1] as f32
    }

    /// Line of intersection with `other`, or `None` when the planes are parallel.
    ///
    /// The returned point is the point of the line closest to the origin.
    pub fn intersect(&self, other: &Plane) -> Option<Line3> {
        let direction = self.normal.cross(&other.normal);
        let len_sq = direction.norm_squared();
        if len_sq < 1e-10 {
            return None;
        }

        let d1 = self.offset();
        let d2 = other.offset();
        let coords = (other.normal.cross(&direction) * d1 + direction.cross(&self.normal) * d2)
            / len_sq;

        Some(Line3 {
            point: Point3f::from(coords),
            direction: direction / len_sq.sqrt(),
        })
    }
}

impl Line3 {
    /// Orthogonal projection of `point` onto the line
    pub fn project_point(&self, point: &Point3f) -> Point3f {
        let t = (point - self.point).dot(&self.direction);
        self.point + self.direction * t
    }

    /// Distance of `point` to the line
    pub fn distance_to_point(&self, point: &Point3f) -> f32 {
        (point - self.project_point(point)).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_projection_lands_on_plane() {
        let plane = Plane::new(Vector3f::new(0.0, 0.0, 2.0), Point3f::new(0.0, 0.0, 1.0)).unwrap();
        let p = plane.project_point(&Point3f::new(3.0, -2.0, 5.0));
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.x, 3.0, epsilon = 1e-6);
        assert_relative_eq!(plane.signed_distance(&p), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_normal_is_rejected() {
        assert!(Plane::new(Vector3f::zeros(), Point3f::origin()).is_none());
    }

    #[test]
    fn test_intersection_of_orthogonal_planes() {
        // z = 1 and x = 2 meet in the line (2, t, 1)
        let floor = Plane::new(Vector3f::z(), Point3f::new(0.0, 0.0, 1.0)).unwrap();
        let wall = Plane::new(Vector3f::x(), Point3f::new(2.0, 0.0, 0.0)).unwrap();

        let line = floor.intersect(&wall).unwrap();
        assert_relative_eq!(line.point.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(line.point.z, 1.0, epsilon = 1e-5);
        assert_relative_eq!(line.direction.y.abs(), 1.0, epsilon = 1e-5);

        let snapped = line.project_point(&Point3f::new(2.3, 4.0, 0.8));
        assert_relative_eq!(snapped.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(snapped.y, 4.0, epsilon = 1e-5);
        assert_relative_eq!(snapped.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_parallel_planes_do_not_intersect() {
        let a = Plane::new(Vector3f::z(), Point3f::origin()).unwrap();
        let b = Plane::new(Vector3f::z(), Point3f::new(0.0, 0.0, 3.0)).unwrap();
        assert!(a.intersect(&b).is_none());
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let plane = Plane::new(Vector3f::new(1.0, 1.0, 0.0), Point3f::origin()).unwrap();
        let (u, v) = plane.basis();
        assert_relative_eq!(u.norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(u.dot(&v), 0.0, epsilon = 1e-6);
        assert_relative_eq!(u.dot(&plane.normal), 0.0, epsilon = 1e-6);
        assert_relative_eq!(u.cross(&v).dot(&plane.normal), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_local_coordinates_round_trip() {
        let plane = Plane::new(Vector3f::new(0.0, 1.0, 1.0), Point3f::new(1.0, 2.0, 3.0)).unwrap();
        let p = plane.project_point(&Point3f::new(4.0, -1.0, 2.0));
        let back = plane.from_local(plane.to_local(&p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-5);
        assert_relative_eq!(back.z, p.z, epsilon = 1e-5);
    }
}
