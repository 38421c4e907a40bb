//! Stable handles into the mesh arenas and pass-scoped handle sets

use slotmap::{new_key_type, Key, SecondaryMap};

new_key_type! {
    /// Handle of a vertex in a [`HalfEdgeMesh`](crate::HalfEdgeMesh).
    pub struct VertexHandle;
}

new_key_type! {
    /// Handle of a half-edge in a [`HalfEdgeMesh`](crate::HalfEdgeMesh).
    pub struct EdgeHandle;
}

new_key_type! {
    /// Handle of a face in a [`HalfEdgeMesh`](crate::HalfEdgeMesh).
    pub struct FaceHandle;
}

/// Index of a region in the mesh's retained region set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub usize);

/// Set of handles owned by a single traversal pass.
///
/// Traversals never mark entities in place; each pass creates (or clears)
/// its own set so no pass can observe marks left by another.
#[derive(Debug, Clone)]
pub struct HandleSet<K: Key> {
    marks: SecondaryMap<K, ()>,
}

impl<K: Key> HandleSet<K> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            marks: SecondaryMap::new(),
        }
    }

    /// Mark `key`; returns `true` if it was not marked before
    pub fn insert(&mut self, key: K) -> bool {
        self.marks.insert(key, ()).is_none()
    }

    /// Check whether `key` is marked
    pub fn contains(&self, key: K) -> bool {
        self.marks.contains_key(key)
    }

    /// Number of marked handles
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Check if nothing is marked
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Unmark everything, keeping the allocation for the next pass
    pub fn clear(&mut self) {
        self.marks.clear();
    }
}

impl<K: Key> Default for HandleSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Visited set over faces
pub type FaceSet = HandleSet<FaceHandle>;

/// Visited set over half-edges
pub type EdgeSet = HandleSet<EdgeHandle>;
