//! Planar segmentation: region growing, plane fitting and crease snapping

use hedgecrate_core::{Plane, Vector3f};
use itertools::Itertools;
use tracing::{debug, info};

use crate::handle::{FaceHandle, FaceSet, HandleSet, RegionId, VertexHandle};
use crate::mesh::Face;
use crate::region::{regression_plane, Region};
use crate::HalfEdgeMesh;

/// Slack on the cosine cut-off of region growing
pub const NORMAL_EPSILON: f32 = 1e-5;

/// Planes whose normals agree at least this much are not intersected
const PARALLEL_COS: f32 = 0.9;

/// Summary of a [`HalfEdgeMesh::optimize_planes`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentationStats {
    /// Regions retained after the final pass
    pub regions: usize,
    /// Retained regions fitted to a plane
    pub planes: usize,
    /// Faces deleted together with too-small regions
    pub small_faces_removed: usize,
    /// Faces deleted because they flicker in their region
    pub flickering_removed: usize,
}

impl HalfEdgeMesh {
    /// Regions retained by the last [`optimize_planes`](Self::optimize_planes)
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0)
    }

    /// Region the face belongs to, if any
    pub fn face_region(&self, f: FaceHandle) -> Option<&Region> {
        self.faces.get(f)?.region.and_then(|r| self.regions.get(r.0))
    }

    /// Grow `region` from `start` over every connected face not yet in `visited`.
    ///
    /// Returns the number of faces added beyond the seed.
    pub fn region_growing(
        &self,
        start: FaceHandle,
        visited: &mut FaceSet,
        region: &mut Region,
    ) -> usize {
        self.grow(start, visited, region, |_| true)
    }

    /// Grow `region` from `start` over connected faces whose normal is within
    /// `cos_threshold` of `plane_normal`.
    ///
    /// Returns the number of faces added beyond the seed.
    pub fn region_growing_with_threshold(
        &self,
        start: FaceHandle,
        plane_normal: &Vector3f,
        cos_threshold: f32,
        visited: &mut FaceSet,
        region: &mut Region,
    ) -> usize {
        let cutoff = cos_threshold - NORMAL_EPSILON;
        self.grow(start, visited, region, |face| face.normal.dot(plane_normal) >= cutoff)
    }

    fn grow<F>(
        &self,
        start: FaceHandle,
        visited: &mut FaceSet,
        region: &mut Region,
        accept: F,
    ) -> usize
    where
        F: Fn(&Face) -> bool,
    {
        if !self.faces.contains_key(start) || !visited.insert(start) {
            return 0;
        }
        region.faces.push(start);

        let mut added = 0;
        let mut stack = vec![start];
        while let Some(f) = stack.pop() {
            for neighbor in self.face_neighbors(f).into_iter().flatten() {
                if visited.contains(neighbor) || !accept(&self.faces[neighbor]) {
                    continue;
                }
                visited.insert(neighbor);
                region.faces.push(neighbor);
                stack.push(neighbor);
                added += 1;
            }
        }
        added
    }

    /// Segment the mesh into planar regions.
    ///
    /// Each pass grows regions from the faces in arena order using the seed's
    /// normal and `angle_threshold` as cosine cut-off. Regions larger than
    /// `max(min_region_size, floor(10 ln(face_count)))` are fitted to a
    /// regression plane and their vertices dragged onto it. After the last
    /// pass regions with fewer than `small_region_size` faces are deleted
    /// from the mesh and the rest are kept as the mesh's region set.
    pub fn optimize_planes(
        &mut self,
        iterations: usize,
        angle_threshold: f32,
        min_region_size: usize,
        small_region_size: usize,
        remove_flickering: bool,
    ) -> SegmentationStats {
        let mut stats = SegmentationStats::default();
        let mut visited = FaceSet::new();

        for pass in 0..iterations {
            visited.clear();
            self.clear_regions();

            let face_count = self.faces.len();
            if face_count == 0 {
                break;
            }
            let fit_size = min_region_size.max((10.0 * (face_count as f32).ln()).floor() as usize);

            let seeds: Vec<FaceHandle> = self.faces.keys().collect();
            let mut regions = Vec::new();
            for seed in seeds {
                if visited.contains(seed) {
                    continue;
                }
                let mut region = Region::new(RegionId(regions.len()));
                let normal = self.faces[seed].normal;
                self.region_growing_with_threshold(
                    seed,
                    &normal,
                    angle_threshold,
                    &mut visited,
                    &mut region,
                );

                if region.size() > fit_size {
                    if let Some(plane) = regression_plane(self, &region.faces) {
                        region.plane = Some(plane);
                        let vertices = region.vertices(self);
                        self.drag_onto_plane(&vertices, &plane);
                    }
                }
                regions.push(region);
            }
            debug!(pass, regions = regions.len(), fit_size, "Grew regions");

            if pass + 1 == iterations {
                stats.small_faces_removed = self.retain_regions(regions, small_region_size);
            }
        }

        if remove_flickering {
            stats.flickering_removed = self.remove_flickering_faces();
        }

        stats.regions = self.regions.len();
        stats.planes = self.regions.iter().filter(|r| r.is_in_plane()).count();
        info!(
            regions = stats.regions,
            planes = stats.planes,
            small_faces_removed = stats.small_faces_removed,
            flickering_removed = stats.flickering_removed,
            "Optimized planes"
        );
        stats
    }

    fn clear_regions(&mut self) {
        self.regions.clear();
        for face in self.faces.values_mut() {
            face.region = None;
        }
    }

    /// Delete regions below `small_region_size` and keep the rest, returning
    /// the number of deleted faces.
    fn retain_regions(&mut self, regions: Vec<Region>, small_region_size: usize) -> usize {
        let (small, kept): (Vec<Region>, Vec<Region>) =
            regions.into_iter().partition(|r| r.size() < small_region_size);

        let mut removed = 0;
        for region in &small {
            for &f in &region.faces {
                self.delete_face(f);
            }
            removed += region.size();
        }

        self.regions = kept
            .into_iter()
            .enumerate()
            .map(|(i, mut region)| {
                region.id = RegionId(i);
                region
            })
            .collect();
        for region in &self.regions {
            for &f in &region.faces {
                if let Some(face) = self.faces.get_mut(f) {
                    face.region = Some(region.id);
                }
            }
        }
        removed
    }

    fn remove_flickering_faces(&mut self) -> usize {
        let flickering: Vec<FaceHandle> = self
            .faces
            .iter()
            .filter(|(_, face)| {
                face.region
                    .and_then(|r| self.regions.get(r.0))
                    .is_some_and(|region| region.detect_flicker(&face.normal))
            })
            .map(|(f, _)| f)
            .collect();

        for &f in &flickering {
            self.delete_face(f);
        }
        if !flickering.is_empty() {
            debug!(count = flickering.len(), "Removed flickering faces");
        }
        flickering.len()
    }

    /// Snap the creases between non-parallel planar regions onto the
    /// intersection line of their planes.
    ///
    /// Only the endpoints of edges shared by the two regions move. Returns
    /// the number of region pairs that were snapped.
    pub fn optimize_plane_intersections(&mut self) -> usize {
        let planar: Vec<(RegionId, Plane)> = self
            .regions
            .iter()
            .filter_map(|r| r.plane.map(|plane| (r.id, plane)))
            .collect();

        let mut snapped = 0;
        let mut touched = Vec::new();
        for ((a, plane_a), (b, plane_b)) in planar.iter().copied().tuple_combinations() {
            if plane_a.normal.dot(&plane_b.normal).abs() >= PARALLEL_COS {
                continue;
            }
            let Some(line) = plane_a.intersect(&plane_b) else {
                continue;
            };

            let mut seen = HandleSet::new();
            let mut border = Vec::new();
            self.border_vertices(a, b, &mut seen, &mut border);
            self.border_vertices(b, a, &mut seen, &mut border);
            if border.is_empty() {
                continue;
            }

            for &v in &border {
                let vertex = &mut self.vertices[v];
                vertex.position = line.project_point(&vertex.position);
            }
            debug!(a = a.0, b = b.0, vertices = border.len(), "Snapped crease");
            touched.extend(border);
            snapped += 1;
        }

        self.refresh_normals_around(&touched);
        info!(pairs = snapped, "Optimized plane intersections");
        snapped
    }

    /// Vertices of edges through which faces of region `a` border region `b`
    fn border_vertices(
        &self,
        a: RegionId,
        b: RegionId,
        seen: &mut HandleSet<VertexHandle>,
        out: &mut Vec<VertexHandle>,
    ) {
        let Some(region) = self.regions.get(a.0) else {
            return;
        };
        for &f in &region.faces {
            if !self.faces.contains_key(f) {
                continue;
            }
            for e in self.face_edges(f) {
                let edge = &self.edges[e];
                let across = self.edges[edge.pair].face.and_then(|g| self.faces[g].region);
                if across != Some(b) {
                    continue;
                }
                for v in [edge.start, edge.end] {
                    if seen.insert(v) {
                        out.push(v);
                    }
                }
            }
        }
    }

    /// Project every vertex of every planar region onto its plane.
    ///
    /// Returns the number of projected vertices. Calling it twice in a row
    /// leaves the mesh unchanged.
    pub fn restore_planes(&mut self) -> usize {
        let mut projected = 0;
        for i in 0..self.regions.len() {
            let Some(plane) = self.regions[i].plane else {
                continue;
            };
            let vertices = self.regions[i].vertices(self);
            projected += vertices.len();
            self.drag_onto_plane(&vertices, &plane);
        }
        debug!(vertices = projected, "Restored planes");
        projected
    }

    fn drag_onto_plane(&mut self, vertices: &[VertexHandle], plane: &Plane) {
        for &v in vertices {
            let vertex = &mut self.vertices[v];
            vertex.position = plane.project_point(&vertex.position);
        }
        self.refresh_normals_around(vertices);
    }

    fn refresh_normals_around(&mut self, vertices: &[VertexHandle]) {
        let mut seen = FaceSet::new();
        let mut faces = Vec::new();
        for &v in vertices {
            for f in self.vertex_faces(v) {
                if seen.insert(f) {
                    faces.push(f);
                }
            }
        }
        for f in faces {
            self.update_face_normal(f);
        }
    }
}
