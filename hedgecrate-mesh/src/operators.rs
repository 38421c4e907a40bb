//! Topology operators: edge collapse, edge flip and guarded collapse.
//!
//! Operators report structural conflicts as `false` and leave the mesh
//! untouched in that case.

use hedgecrate_core::{midpoint, Point3f};

use crate::handle::{EdgeHandle, FaceHandle, VertexHandle};
use crate::HalfEdgeMesh;

impl HalfEdgeMesh {
    /// Collapse `e`, merging its end vertex into its start vertex at their midpoint.
    ///
    /// Every face on either side of `e` is removed. Its two other edges are
    /// released and their twins become each other's pair, so the surface
    /// closes over the removed triangle. Returns `false` for a stale handle.
    pub fn collapse_edge(&mut self, e: EdgeHandle) -> bool {
        let Some(edge) = self.edges.get(e) else {
            return false;
        };
        let (keep, remove, pair) = (edge.start, edge.end, edge.pair);

        let keep_normal = self.vertices[keep].normal;
        let remove_normal = self.vertices[remove].normal;
        let merged = midpoint(&self.vertices[keep].position, &self.vertices[remove].position);
        let vertex = &mut self.vertices[keep];
        vertex.position = merged;
        vertex.normal = (keep_normal + remove_normal)
            .try_normalize(f32::EPSILON)
            .unwrap_or(keep_normal);

        for side in [e, pair] {
            self.collapse_side(side);
        }
        self.delete_edge(e, true);

        // Hand everything attached to the removed vertex over to the kept one
        let (outgoing, incoming) = {
            let gone = &mut self.vertices[remove];
            (std::mem::take(&mut gone.outgoing), std::mem::take(&mut gone.incoming))
        };
        for &h in &outgoing {
            self.edges[h].start = keep;
        }
        for &h in &incoming {
            self.edges[h].end = keep;
        }
        let kept = &mut self.vertices[keep];
        kept.outgoing.extend(outgoing);
        kept.incoming.extend(incoming);
        self.vertices.remove(remove);

        for f in self.vertex_faces(keep) {
            self.update_face_normal(f);
        }
        true
    }

    /// Remove the face on `side` (if any) together with its two other edges
    fn collapse_side(&mut self, side: EdgeHandle) {
        let Some(face) = self.edges[side].face else {
            return;
        };
        let next = self.next_of(side);
        let prev = self.next_of(next);
        let next_twin = self.edges[next].pair;
        let prev_twin = self.edges[prev].pair;

        self.edges[next_twin].pair = prev_twin;
        self.edges[prev_twin].pair = next_twin;

        self.delete_edge(prev, false);
        self.delete_edge(next, false);
        self.edges[side].face = None;
        self.edges[side].next = None;
        self.remove_face_record(face);
    }

    /// Replace the diagonal `e` of its two adjacent triangles by the other diagonal.
    ///
    /// Returns `false` without touching the mesh when either side of `e` is
    /// boundary, both triangles share their apex, or the apexes are already
    /// connected by an edge.
    pub fn flip_edge(&mut self, e: EdgeHandle) -> bool {
        let Some(edge) = self.edges.get(e) else {
            return false;
        };
        let pair = edge.pair;
        let (Some(f1), Some(f2)) = (edge.face, self.edges[pair].face) else {
            return false;
        };

        // f1 = (a, b, c) through e = a -> b, f2 = (b, a, d) through pair
        let n1 = self.next_of(e);
        let p1 = self.next_of(n1);
        let n2 = self.next_of(pair);
        let p2 = self.next_of(n2);
        let c = self.edges[n1].end;
        let d = self.edges[n2].end;
        if c == d || self.find_edge(c, d).is_some() {
            return false;
        }

        self.delete_edge(e, true);
        let (d_to_c, c_to_d) = self.new_edge_pair(d, c);

        // f1 becomes (a, d, c), f2 becomes (b, c, d)
        self.link_face(f1, [n2, d_to_c, p1]);
        self.link_face(f2, [n1, c_to_d, p2]);
        self.update_face_normal(f1);
        self.update_face_normal(f2);
        true
    }

    fn link_face(&mut self, f: FaceHandle, cycle: [EdgeHandle; 3]) {
        for k in 0..3 {
            let edge = &mut self.edges[cycle[k]];
            edge.face = Some(f);
            edge.next = Some(cycle[(k + 1) % 3]);
        }
        self.faces[f].edge = cycle[0];
    }

    /// Collapse `e` only if that cannot break the surface.
    ///
    /// The collapse is rejected when it would
    /// - squash a cap (the start or end vertex has valence three around `e`),
    /// - merge parallel edges between the two endpoints,
    /// - remove a face whose other two edges are both on the boundary,
    /// - shrink a triangular hole to a degenerate one,
    /// - turn any surrounding face over.
    ///
    /// On rejection the mesh is left untouched.
    pub fn safe_collapse_edge(&mut self, e: EdgeHandle) -> bool {
        let Some(edge) = self.edges.get(e) else {
            return false;
        };
        let pair = edge.pair;

        if self.is_cap(e) || self.is_cap(pair) {
            return false;
        }

        let parallel = self.vertices[edge.start]
            .outgoing
            .iter()
            .filter(|&&h| self.edges[h].end == edge.end)
            .count();
        if parallel > 1 {
            return false;
        }

        if self.strands_face(e) || self.strands_face(pair) {
            return false;
        }

        if self.closes_boundary_triangle(e) || self.closes_boundary_triangle(pair) {
            return false;
        }

        if self.collapse_flickers(e) {
            return false;
        }

        self.collapse_edge(e)
    }

    /// The face on `side` and the face across its second edge enclose the
    /// shared vertex completely together with the face on the other side.
    fn is_cap(&self, side: EdgeHandle) -> bool {
        let edge = &self.edges[side];
        if edge.face.is_none() {
            return false;
        }
        let other = &self.edges[edge.pair];
        if other.face.is_none() {
            return false;
        }

        let prev_twin = self.edges[self.next_of(self.next_of(side))].pair;
        if self.edges[prev_twin].face.is_none() {
            return false;
        }
        let around = self.next_of(self.next_of(prev_twin));
        let other_next_twin = self.edges[self.next_of(edge.pair)].pair;
        around == other_next_twin
    }

    /// The face on `side` hangs on `side` alone
    fn strands_face(&self, side: EdgeHandle) -> bool {
        if self.edges[side].face.is_none() {
            return false;
        }
        let next = self.next_of(side);
        let prev = self.next_of(next);
        self.edges[self.edges[next].pair].face.is_none()
            && self.edges[self.edges[prev].pair].face.is_none()
    }

    /// `side` is a boundary edge and two more boundary edges lead from its
    /// end back to its start.
    fn closes_boundary_triangle(&self, side: EdgeHandle) -> bool {
        let edge = &self.edges[side];
        if edge.face.is_some() {
            return false;
        }
        let boundary_from = |v: VertexHandle| {
            self.vertices[v]
                .outgoing
                .iter()
                .copied()
                .filter(move |&h| h != side && self.edges[h].face.is_none())
        };
        boundary_from(edge.end).any(|first| {
            boundary_from(self.edges[first].end).any(|second| self.edges[second].end == edge.start)
        })
    }

    /// Check whether moving both endpoints of `e` to their midpoint turns a
    /// surviving face against its region plane, or against its current
    /// orientation when it has no planar region.
    fn collapse_flickers(&self, e: EdgeHandle) -> bool {
        let edge = &self.edges[e];
        let (a, b) = (edge.start, edge.end);
        let removed = [edge.face, self.edges[edge.pair].face];
        let merged = midpoint(&self.vertices[a].position, &self.vertices[b].position);

        let mut touched = self.vertex_faces(a);
        for f in self.vertex_faces(b) {
            if !touched.contains(&f) {
                touched.push(f);
            }
        }

        touched
            .into_iter()
            .filter(|f| !removed.contains(&Some(*f)))
            .any(|f| {
                let corners = self.face_vertices(f);
                let positions: [Point3f; 3] = corners.map(|v| {
                    if v == a || v == b {
                        merged
                    } else {
                        self.vertices[v].position
                    }
                });
                let moved = self.normal_from_corners(corners, positions);
                let face = &self.faces[f];
                match face.region.and_then(|r| self.regions.get(r.0)) {
                    Some(region) if region.is_in_plane() => region.detect_flicker(&moved),
                    _ => moved.dot(&face.normal) < 0.0,
                }
            })
    }
}
