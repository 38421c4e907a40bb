//! Hole detection and filling

use tracing::{debug, info};

use crate::handle::{EdgeHandle, EdgeSet, FaceHandle};
use crate::HalfEdgeMesh;

impl HalfEdgeMesh {
    /// Boundary contours of the mesh as chains of faceless half-edges.
    ///
    /// A contour follows the first unvisited faceless edge leaving each
    /// vertex, so holes that touch in a vertex may be split or merged
    /// depending on insertion order.
    pub fn boundary_contours(&self) -> Vec<Vec<EdgeHandle>> {
        let mut visited = EdgeSet::new();
        let mut contours = Vec::new();
        for f in self.faces.keys() {
            for e in self.face_edges(f) {
                let twin = self.edges[e].pair;
                if self.edges[twin].face.is_some() || visited.contains(twin) {
                    continue;
                }
                contours.push(self.walk_contour(twin, &mut visited));
            }
        }
        contours
    }

    fn walk_contour(&self, start: EdgeHandle, visited: &mut EdgeSet) -> Vec<EdgeHandle> {
        let mut contour = Vec::new();
        let mut current = Some(start);
        while let Some(e) = current {
            let edge = &self.edges[e];
            // Parallel edges between the same endpoints belong to this contour too
            for &h in &self.vertices[edge.start].outgoing {
                if self.edges[h].end == edge.end {
                    visited.insert(h);
                }
            }
            contour.push(e);

            current = self.vertices[edge.end]
                .outgoing
                .iter()
                .copied()
                .find(|&h| self.edges[h].face.is_none() && !visited.contains(h));
        }
        contour
    }

    /// Fill every hole bounded by at least 3 and fewer than `max_size` edges.
    ///
    /// Each hole is first shrunk by guarded edge collapses, then closed with
    /// triangles over 3-cycles of its boundary. New faces join the region of
    /// a neighbouring face. Shapes that cannot be closed are left open.
    /// Returns the number of faces created.
    pub fn fill_holes(&mut self, max_size: usize) -> usize {
        let contours: Vec<Vec<EdgeHandle>> = self
            .boundary_contours()
            .into_iter()
            .filter(|c| c.len() >= 3 && c.len() < max_size)
            .collect();
        let holes = contours.len();

        let mut created = 0;
        for contour in contours {
            created += self.fill_contour(contour);
        }
        info!(holes, faces = created, "Filled holes");
        created
    }

    fn fill_contour(&mut self, mut contour: Vec<EdgeHandle>) -> usize {
        let initial = contour.len();

        // Shrink: restart the scan after every successful collapse
        'shrink: loop {
            contour.retain(|&e| self.edges.get(e).is_some_and(|edge| edge.face.is_none()));
            for i in 0..contour.len() {
                if self.safe_collapse_edge(contour[i]) {
                    contour.remove(i);
                    continue 'shrink;
                }
            }
            break;
        }

        let mut created = 0;
        while !contour.is_empty() {
            contour.retain(|&e| self.edges.get(e).is_some_and(|edge| edge.face.is_none()));
            let Some((i, j, k)) = self.find_closing_triple(&contour) else {
                contour.pop();
                continue;
            };

            let (a, b, c) = (
                self.edges[contour[i]].start,
                self.edges[contour[j]].start,
                self.edges[contour[k]].start,
            );
            let face = self.add_face(a, b, c);
            self.adopt_neighbor_region(face);
            created += 1;

            let mut taken = [i, j, k];
            taken.sort_unstable();
            for &index in taken.iter().rev() {
                contour.remove(index);
            }
        }

        if created == 0 {
            debug!(edges = initial, "Hole left open");
        } else {
            debug!(edges = initial, faces = created, "Closed hole");
        }
        created
    }

    /// Indices of three contour edges chaining into a closed triangle
    fn find_closing_triple(&self, contour: &[EdgeHandle]) -> Option<(usize, usize, usize)> {
        let ends = |i: usize| {
            let edge = &self.edges[contour[i]];
            (edge.start, edge.end)
        };
        for i in 0..contour.len() {
            let (start_i, end_i) = ends(i);
            for j in 0..contour.len() {
                let (start_j, end_j) = ends(j);
                if j == i || start_j != end_i {
                    continue;
                }
                for k in 0..contour.len() {
                    let (start_k, end_k) = ends(k);
                    if k != i && k != j && start_k == end_j && end_k == start_i {
                        return Some((i, j, k));
                    }
                }
            }
        }
        None
    }

    fn adopt_neighbor_region(&mut self, face: FaceHandle) {
        let region = self
            .face_neighbors(face)
            .into_iter()
            .flatten()
            .find_map(|f| self.faces[f].region);
        if let Some(id) = region {
            if let Some(r) = self.regions.get_mut(id.0) {
                r.faces.push(face);
                self.faces[face].region = Some(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use crate::handle::RegionId;

    #[test]
    fn test_boundary_contours_of_grid() {
        let mesh = make_plane_grid(4);
        let contours = mesh.boundary_contours();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 12);

        // The contour is a closed chain
        let first = mesh.edge(contours[0][0]).unwrap();
        let last = mesh.edge(*contours[0].last().unwrap()).unwrap();
        assert_eq!(last.end(), first.start());
    }

    #[test]
    fn test_closed_mesh_has_no_contours() {
        let mesh = make_octahedron();
        assert!(mesh.boundary_contours().is_empty());
    }

    #[test]
    fn test_fill_triangular_hole() {
        let mut mesh = make_octahedron();
        let f = mesh.face_handles().next().unwrap();
        mesh.delete_face(f);
        assert_eq!(mesh.boundary_edge_count(), 3);

        assert_eq!(mesh.fill_holes(4), 1);
        assert_eq!(mesh.boundary_edge_count(), 0);
        assert_eq!(mesh.face_count(), 8);
        mesh.check_invariants().unwrap();
    }

    #[test]
    fn test_fill_holes_respects_max_size() {
        let mut mesh = make_octahedron();
        let f = mesh.face_handles().next().unwrap();
        mesh.delete_face(f);

        assert_eq!(mesh.fill_holes(3), 0);
        assert_eq!(mesh.boundary_edge_count(), 3);
    }

    #[test]
    fn test_fill_quad_hole() {
        let mut mesh = make_octahedron();
        let top: Vec<_> = mesh.face_handles().take(2).collect();
        for f in top {
            mesh.delete_face(f);
        }
        assert_eq!(mesh.boundary_contours()[0].len(), 4);

        assert!(mesh.fill_holes(10) > 0);
        assert_eq!(mesh.boundary_edge_count(), 0);
        mesh.check_invariants().unwrap();
    }

    #[test]
    fn test_filled_face_joins_neighbor_region() {
        let mut mesh = make_octahedron();
        mesh.optimize_planes(1, -1.0, 100, 1, false);
        assert_eq!(mesh.regions().len(), 1);

        let f = mesh.face_handles().next().unwrap();
        mesh.delete_face(f);
        assert_eq!(mesh.regions()[0].size(), 7);

        assert_eq!(mesh.fill_holes(4), 1);
        assert_eq!(mesh.regions()[0].size(), 8);
        for f in mesh.face_handles() {
            assert_eq!(mesh.face(f).unwrap().region(), Some(RegionId(0)));
        }
    }
}
