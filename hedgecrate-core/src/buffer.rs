//! Flat output buffers handed to exporters and renderers

use crate::mesh::TriangleMesh;
use crate::point::*;
use crate::traits::Texture;
use serde::{Deserialize, Serialize};

/// Texture id stored for triangles that carry no texture
pub const NO_TEXTURE: u32 = u32::MAX;

/// Fraction of the capacity that may be used before a [`GrowBuffer`] doubles
const GROW_THRESHOLD: f32 = 0.75;

/// Final mesh data as flat arrays.
///
/// Positions, normals and texture coordinates are interleaved per vertex
/// (`3`, `3` and `2` components), colours are `3` bytes per vertex and
/// indices are `3` per triangle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshBuffer {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub colors: Vec<u8>,
    pub indices: Vec<u32>,
    pub texture_coords: Option<Vec<f32>>,
    /// One entry per triangle, [`NO_TEXTURE`] for untextured triangles
    pub triangle_textures: Option<Vec<u32>>,
    /// Ids of all textures referenced by `triangle_textures`
    pub texture_ids: Option<Vec<u32>>,
    #[serde(skip)]
    pub textures: Vec<Texture>,
}

impl MeshBuffer {
    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Number of triangles
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if the buffer holds no triangles
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of vertex `i`
    pub fn position(&self, i: usize) -> Point3f {
        Point3f::new(self.vertices[3 * i], self.vertices[3 * i + 1], self.vertices[3 * i + 2])
    }

    /// Convert into an indexed [`TriangleMesh`]
    pub fn to_triangle_mesh(&self) -> TriangleMesh {
        let vertices = (0..self.vertex_count()).map(|i| self.position(i)).collect();
        let faces = self
            .indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
            .collect();

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        mesh.set_normals(
            self.normals
                .chunks_exact(3)
                .map(|n| Vector3f::new(n[0], n[1], n[2]))
                .collect(),
        );
        mesh.set_colors(self.colors.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect());
        mesh
    }
}

/// Owned buffer with the amortized doubling policy of the retessellating
/// finalizer: capacity doubles whenever usage would cross 75 % of it.
#[derive(Debug, Clone)]
pub struct GrowBuffer<T> {
    data: Vec<T>,
}

impl<T> GrowBuffer<T> {
    /// Create a buffer pre-sized for `capacity` elements
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity.max(1)),
        }
    }

    /// Number of elements in use
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if no element is in use
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current capacity
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Append `values`, doubling the capacity first if needed
    pub fn extend_from_slice(&mut self, values: &[T])
    where
        T: Clone,
    {
        self.ensure(values.len());
        self.data.extend_from_slice(values);
    }

    /// Append one element, doubling the capacity first if needed
    pub fn push(&mut self, value: T) {
        self.ensure(1);
        self.data.push(value);
    }

    /// Elements in use
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Trim to the exact size and hand out the storage
    pub fn into_trimmed(mut self) -> Vec<T> {
        self.data.shrink_to_fit();
        self.data
    }

    fn ensure(&mut self, additional: usize) {
        let needed = self.data.len() + additional;
        let mut capacity = self.data.capacity().max(1);
        while needed as f32 > capacity as f32 * GROW_THRESHOLD {
            capacity *= 2;
        }
        if capacity > self.data.capacity() {
            self.data.reserve_exact(capacity - self.data.len());
        }
    }
}
