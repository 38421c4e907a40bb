//! Half-edge mesh container.
//!
//! Vertices, half-edges and faces live in three arenas and refer to each
//! other through stable handles:
//!
//! - every half-edge has a **pair** running in the opposite direction
//! - a faced half-edge has a **next** half-edge closing a 3-cycle around its face
//! - a half-edge without a face lies on the boundary and has no next
//! - every vertex lists all of its outgoing and incoming half-edges
//!
//! Insertion reuses the faceless twin of an existing edge when a triangle is
//! added next to one that already exists. Inconsistently wound or duplicate
//! triangles are not detected; they produce extra parallel edges instead.

use hedgecrate_core::{
    triangle_normal, Error, NormalPoint3f, Point3f, Result, TriangleMesh, Vector3f,
};
use slotmap::SlotMap;

use crate::handle::{EdgeHandle, FaceHandle, RegionId, VertexHandle};
use crate::region::Region;

/// A mesh vertex
#[derive(Debug, Clone)]
pub struct Vertex {
    pub position: Point3f,
    pub normal: Vector3f,
    /// Insertion index, used by [`HalfEdgeMesh::add_triangle`]
    pub index: usize,
    pub(crate) outgoing: Vec<EdgeHandle>,
    pub(crate) incoming: Vec<EdgeHandle>,
}

impl Vertex {
    /// Half-edges starting at this vertex
    pub fn outgoing(&self) -> &[EdgeHandle] {
        &self.outgoing
    }

    /// Half-edges ending at this vertex
    pub fn incoming(&self) -> &[EdgeHandle] {
        &self.incoming
    }
}

/// A directed half-edge
#[derive(Debug, Clone)]
pub struct HalfEdge {
    pub(crate) start: VertexHandle,
    pub(crate) end: VertexHandle,
    pub(crate) pair: EdgeHandle,
    pub(crate) next: Option<EdgeHandle>,
    pub(crate) face: Option<FaceHandle>,
}

impl HalfEdge {
    pub fn start(&self) -> VertexHandle {
        self.start
    }

    pub fn end(&self) -> VertexHandle {
        self.end
    }

    pub fn pair(&self) -> EdgeHandle {
        self.pair
    }

    pub fn next(&self) -> Option<EdgeHandle> {
        self.next
    }

    pub fn face(&self) -> Option<FaceHandle> {
        self.face
    }

    /// Check if no face lies on this side of the edge
    pub fn is_boundary(&self) -> bool {
        self.face.is_none()
    }
}

/// A triangular face
#[derive(Debug, Clone)]
pub struct Face {
    pub(crate) edge: EdgeHandle,
    pub normal: Vector3f,
    pub(crate) region: Option<RegionId>,
}

impl Face {
    /// Anchor half-edge of the face's 3-cycle
    pub fn edge(&self) -> EdgeHandle {
        self.edge
    }

    /// Region the face was assigned to by the last segmentation
    pub fn region(&self) -> Option<RegionId> {
        self.region
    }
}

/// Half-edge triangle mesh
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: SlotMap<VertexHandle, Vertex>,
    pub(crate) edges: SlotMap<EdgeHandle, HalfEdge>,
    pub(crate) faces: SlotMap<FaceHandle, Face>,
    /// Insertion order of vertices; entries of deleted vertices go stale
    pub(crate) vertex_order: Vec<VertexHandle>,
    pub(crate) regions: Vec<Region>,
}

impl HalfEdgeMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mesh with room for the given number of vertices and faces
    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: SlotMap::with_capacity_and_key(vertices),
            edges: SlotMap::with_capacity_and_key(faces * 3 + vertices),
            faces: SlotMap::with_capacity_and_key(faces),
            vertex_order: Vec::with_capacity(vertices),
            regions: Vec::new(),
        }
    }

    /// Build a mesh from a triangle soup with per-vertex normals
    pub fn from_soup(points: &[NormalPoint3f], triangles: &[[usize; 3]]) -> Result<Self> {
        let mut mesh = Self::with_capacity(points.len(), triangles.len());
        for point in points {
            mesh.add_vertex(point.position);
            mesh.add_normal(point.normal);
        }
        for t in triangles {
            mesh.add_triangle(t[0], t[1], t[2])?;
        }
        Ok(mesh)
    }

    /// Build a mesh from an indexed [`TriangleMesh`]
    pub fn from_triangle_mesh(mesh: &TriangleMesh) -> Result<Self> {
        let mut hem = Self::with_capacity(mesh.vertex_count(), mesh.face_count());
        for (i, position) in mesh.vertices.iter().enumerate() {
            hem.add_vertex(*position);
            if let Some(normals) = &mesh.normals {
                hem.add_normal(normals[i]);
            }
        }
        for face in &mesh.faces {
            hem.add_triangle(face[0], face[1], face[2])?;
        }
        Ok(hem)
    }

    // ------------------------------------------------------------------
    // Counts and accessors
    // ------------------------------------------------------------------

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Get the number of half-edges (twice the number of edges)
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if the mesh has no faces
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn vertex(&self, v: VertexHandle) -> Option<&Vertex> {
        self.vertices.get(v)
    }

    pub fn edge(&self, e: EdgeHandle) -> Option<&HalfEdge> {
        self.edges.get(e)
    }

    pub fn face(&self, f: FaceHandle) -> Option<&Face> {
        self.faces.get(f)
    }

    /// Set the position of a vertex. Face normals are not refreshed.
    pub fn set_position(&mut self, v: VertexHandle, position: Point3f) {
        if let Some(vertex) = self.vertices.get_mut(v) {
            vertex.position = position;
        }
    }

    pub fn vertex_handles(&self) -> impl Iterator<Item = VertexHandle> + '_ {
        self.vertices.keys()
    }

    pub fn edge_handles(&self) -> impl Iterator<Item = EdgeHandle> + '_ {
        self.edges.keys()
    }

    /// Face handles in arena order
    pub fn face_handles(&self) -> impl Iterator<Item = FaceHandle> + '_ {
        self.faces.keys()
    }

    /// Handle of the vertex inserted as number `index`, if it still exists
    pub fn vertex_by_index(&self, index: usize) -> Option<VertexHandle> {
        self.vertex_order
            .get(index)
            .copied()
            .filter(|&v| self.vertices.contains_key(v))
    }

    /// Next half-edge around the face. Boundary edges map to themselves.
    pub(crate) fn next_of(&self, e: EdgeHandle) -> EdgeHandle {
        self.edges[e].next.unwrap_or(e)
    }

    /// The three half-edges of a face, starting at its anchor
    pub fn face_edges(&self, f: FaceHandle) -> [EdgeHandle; 3] {
        let e0 = self.faces[f].edge;
        let e1 = self.next_of(e0);
        let e2 = self.next_of(e1);
        [e0, e1, e2]
    }

    /// The three corners of a face in winding order
    pub fn face_vertices(&self, f: FaceHandle) -> [VertexHandle; 3] {
        self.face_edges(f).map(|e| self.edges[e].start)
    }

    /// The three corner positions of a face in winding order
    pub fn face_positions(&self, f: FaceHandle) -> [Point3f; 3] {
        self.face_vertices(f).map(|v| self.vertices[v].position)
    }

    /// Faces adjacent to `f` across its three edges
    pub fn face_neighbors(&self, f: FaceHandle) -> [Option<FaceHandle>; 3] {
        self.face_edges(f).map(|e| self.edges[self.edges[e].pair].face)
    }

    /// First outgoing half-edge of `from` ending at `to`
    pub fn find_edge(&self, from: VertexHandle, to: VertexHandle) -> Option<EdgeHandle> {
        self.vertices
            .get(from)?
            .outgoing
            .iter()
            .copied()
            .find(|&e| self.edges[e].end == to)
    }

    /// All faces incident to a vertex, without duplicates
    pub fn vertex_faces(&self, v: VertexHandle) -> Vec<FaceHandle> {
        let Some(vertex) = self.vertices.get(v) else {
            return Vec::new();
        };
        let mut faces: Vec<FaceHandle> = Vec::new();
        for &e in vertex.outgoing.iter().chain(vertex.incoming.iter()) {
            if let Some(f) = self.edges[e].face {
                if !faces.contains(&f) {
                    faces.push(f);
                }
            }
        }
        faces
    }

    /// Number of half-edges without a face
    pub fn boundary_edge_count(&self) -> usize {
        self.edges.values().filter(|e| e.face.is_none()).count()
    }

    // ------------------------------------------------------------------
    // Normals
    // ------------------------------------------------------------------

    /// Normal of a face from its current corner positions.
    ///
    /// Degenerate faces fall back to the averaged vertex normals.
    pub fn compute_face_normal(&self, f: FaceHandle) -> Vector3f {
        let [a, b, c] = self.face_vertices(f);
        self.normal_from_corners(
            [a, b, c],
            [self.vertices[a].position, self.vertices[b].position, self.vertices[c].position],
        )
    }

    pub(crate) fn normal_from_corners(
        &self,
        corners: [VertexHandle; 3],
        positions: [Point3f; 3],
    ) -> Vector3f {
        triangle_normal(&positions[0], &positions[1], &positions[2]).unwrap_or_else(|| {
            let sum: Vector3f = corners.iter().map(|&v| self.vertices[v].normal).sum();
            sum.try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::zeros)
        })
    }

    /// Recompute the cached normal of one face
    pub fn update_face_normal(&mut self, f: FaceHandle) {
        if self.faces.contains_key(f) {
            let normal = self.compute_face_normal(f);
            self.faces[f].normal = normal;
        }
    }

    /// Recompute all cached face normals
    pub fn update_face_normals(&mut self) {
        let handles: Vec<FaceHandle> = self.faces.keys().collect();
        for f in handles {
            self.update_face_normal(f);
        }
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Add a vertex; its normal defaults to +Z until [`add_normal`](Self::add_normal)
    pub fn add_vertex(&mut self, position: Point3f) -> VertexHandle {
        let index = self.vertex_order.len();
        let v = self.vertices.insert(Vertex {
            position,
            normal: Vector3f::z(),
            index,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        });
        self.vertex_order.push(v);
        v
    }

    /// Set the normal of the most recently added vertex.
    ///
    /// Normals must be added in the same order as the vertices.
    pub fn add_normal(&mut self, normal: Vector3f) {
        if let Some(vertex) = self
            .vertex_order
            .last()
            .and_then(|&v| self.vertices.get_mut(v))
        {
            vertex.normal = normal;
        }
    }

    /// Add the triangle formed by the vertices inserted as numbers `i`, `j`, `k`
    pub fn add_triangle(&mut self, i: usize, j: usize, k: usize) -> Result<FaceHandle> {
        let lookup = |index: usize| {
            self.vertex_by_index(index).ok_or_else(|| {
                Error::InvalidData(format!(
                    "Triangle ({}, {}, {}) references missing vertex {}",
                    i, j, k, index
                ))
            })
        };
        let (a, b, c) = (lookup(i)?, lookup(j)?, lookup(k)?);
        Ok(self.add_face(a, b, c))
    }

    /// Add the triangle `(a, b, c)`.
    ///
    /// # Panics
    ///
    /// Panics if any handle does not refer to a live vertex.
    pub fn add_face(&mut self, a: VertexHandle, b: VertexHandle, c: VertexHandle) -> FaceHandle {
        let corners = [a, b, c];
        let face = self.faces.insert(Face {
            edge: EdgeHandle::default(),
            normal: Vector3f::zeros(),
            region: None,
        });

        let mut cycle = [EdgeHandle::default(); 3];
        for k in 0..3 {
            let current = corners[k];
            let next = corners[(k + 1) % 3];

            // An edge next -> current with a free twin means a neighbour is already there
            let reusable = self.vertices[next]
                .outgoing
                .iter()
                .copied()
                .filter(|&e| self.edges[e].end == current)
                .map(|e| self.edges[e].pair)
                .find(|&twin| self.edges[twin].face.is_none());

            let edge = match reusable {
                Some(twin) => twin,
                None => self.new_edge_pair(current, next).0,
            };
            self.edges[edge].face = Some(face);
            cycle[k] = edge;
        }

        for k in 0..3 {
            self.edges[cycle[k]].next = Some(cycle[(k + 1) % 3]);
        }
        self.faces[face].edge = cycle[0];
        self.update_face_normal(face);
        face
    }

    /// Allocate a faceless half-edge `from -> to` and its twin
    pub(crate) fn new_edge_pair(
        &mut self,
        from: VertexHandle,
        to: VertexHandle,
    ) -> (EdgeHandle, EdgeHandle) {
        let forward = self.edges.insert(HalfEdge {
            start: from,
            end: to,
            pair: EdgeHandle::default(),
            next: None,
            face: None,
        });
        let backward = self.edges.insert(HalfEdge {
            start: to,
            end: from,
            pair: forward,
            next: None,
            face: None,
        });
        self.edges[forward].pair = backward;

        self.vertices[from].outgoing.push(forward);
        self.vertices[to].incoming.push(forward);
        self.vertices[to].outgoing.push(backward);
        self.vertices[from].incoming.push(backward);
        (forward, backward)
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    /// Unlink a half-edge from its endpoints and release it.
    ///
    /// With `also_delete_pair` the twin is released the same way; otherwise
    /// the caller is responsible for the twin.
    pub fn delete_edge(&mut self, e: EdgeHandle, also_delete_pair: bool) {
        let Some(edge) = self.edges.get(e) else {
            return;
        };
        let pair = edge.pair;
        self.unlink_edge(e);
        if also_delete_pair {
            self.unlink_edge(pair);
        }
    }

    fn unlink_edge(&mut self, e: EdgeHandle) {
        let Some(edge) = self.edges.remove(e) else {
            return;
        };
        if let Some(start) = self.vertices.get_mut(edge.start) {
            start.outgoing.retain(|&x| x != e);
        }
        if let Some(end) = self.vertices.get_mut(edge.end) {
            end.incoming.retain(|&x| x != e);
        }
    }

    /// Delete a face. Edge pairs left faceless on both sides are deleted, and
    /// so are vertices left without outgoing edges.
    pub fn delete_face(&mut self, f: FaceHandle) {
        if !self.faces.contains_key(f) {
            return;
        }
        let cycle = self.face_edges(f);
        for &e in &cycle {
            let edge = &mut self.edges[e];
            edge.face = None;
            edge.next = None;
        }

        for &e in &cycle {
            let Some(edge) = self.edges.get(e) else {
                continue;
            };
            if self.edges[edge.pair].face.is_some() {
                continue;
            }
            let (start, end) = (edge.start, edge.end);
            self.delete_edge(e, true);
            for v in [start, end] {
                if self.vertices.get(v).is_some_and(|vertex| vertex.outgoing.is_empty()) {
                    self.vertices.remove(v);
                }
            }
        }

        self.remove_face_record(f);
    }

    /// Delete a vertex together with every face and edge touching it
    pub fn delete_vertex(&mut self, v: VertexHandle) {
        for f in self.vertex_faces(v) {
            self.delete_face(f);
        }

        let Some(vertex) = self.vertices.get(v) else {
            return;
        };
        let remaining: Vec<EdgeHandle> = vertex.outgoing.clone();
        for e in remaining {
            let Some(edge) = self.edges.get(e) else {
                continue;
            };
            let other = edge.end;
            self.delete_edge(e, true);
            if self.vertices.get(other).is_some_and(|vertex| vertex.outgoing.is_empty()) {
                self.vertices.remove(other);
            }
        }
        self.vertices.remove(v);
    }

    /// Release a face without touching its edges and drop it from its region
    pub(crate) fn remove_face_record(&mut self, f: FaceHandle) {
        let Some(face) = self.faces.remove(f) else {
            return;
        };
        if let Some(region) = face.region.and_then(|r| self.regions.get_mut(r.0)) {
            if let Some(pos) = region.faces.iter().position(|&x| x == f) {
                region.faces.remove(pos);
            }
        }
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Verify the structural invariants of the half-edge graph
    pub fn check_invariants(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::InvalidData(msg));

        for (h, edge) in &self.edges {
            let Some(pair) = self.edges.get(edge.pair) else {
                return fail(format!("{:?} has a dangling pair", h));
            };
            if pair.pair != h {
                return fail(format!("pair of pair of {:?} is not itself", h));
            }
            if pair.start != edge.end || pair.end != edge.start {
                return fail(format!("{:?} and its pair disagree on endpoints", h));
            }
            if !self.vertices.get(edge.start).is_some_and(|v| v.outgoing.contains(&h)) {
                return fail(format!("{:?} missing from outgoing list of its start", h));
            }
            if !self.vertices.get(edge.end).is_some_and(|v| v.incoming.contains(&h)) {
                return fail(format!("{:?} missing from incoming list of its end", h));
            }

            match edge.face {
                Some(f) => {
                    if !self.faces.contains_key(f) {
                        return fail(format!("{:?} references a deleted face", h));
                    }
                    let mut current = h;
                    for _ in 0..3 {
                        let Some(next) = self.edges.get(current).and_then(|e| e.next) else {
                            return fail(format!("face cycle through {:?} is open", h));
                        };
                        if self.edges.get(next).and_then(|e| e.face) != Some(f) {
                            return fail(format!("face cycle through {:?} leaves its face", h));
                        }
                        if self.edges[current].end != self.edges[next].start {
                            return fail(format!("face cycle through {:?} is disconnected", h));
                        }
                        current = next;
                    }
                    if current != h {
                        return fail(format!("face cycle through {:?} is not a triangle", h));
                    }
                }
                None => {
                    if edge.next.is_some() {
                        return fail(format!("boundary edge {:?} has a next edge", h));
                    }
                }
            }
        }

        for (v, vertex) in &self.vertices {
            if vertex.outgoing.iter().any(|&e| self.edges.get(e).map(|e| e.start) != Some(v)) {
                return fail(format!("outgoing list of {:?} holds a foreign edge", v));
            }
            if vertex.incoming.iter().any(|&e| self.edges.get(e).map(|e| e.end) != Some(v)) {
                return fail(format!("incoming list of {:?} holds a foreign edge", v));
            }
        }

        for (f, face) in &self.faces {
            if self.edges.get(face.edge).and_then(|e| e.face) != Some(f) {
                return fail(format!("anchor edge of {:?} does not belong to it", f));
            }
        }

        Ok(())
    }
}
