//! Conversion of the half-edge mesh into flat render buffers

use hedgecrate_core::{
    Error, GrowBuffer, MeshBuffer, Plane, Point3f, Result, Rgb, TessellatedPatch, Tessellator,
    Texture, TextureProjection, TextureProjector, Vector3f, NO_TEXTURE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::SecondaryMap;
use tracing::{debug, info, warn};

use crate::handle::{EdgeHandle, EdgeSet, FaceHandle, RegionId, VertexHandle};
use crate::region::Region;
use crate::HalfEdgeMesh;

/// Colour of faces that belong to no region
pub const DEFAULT_COLOR: Rgb = [128, 128, 128];

/// Pseudo-random but stable colour of a region
pub fn region_color(id: RegionId) -> Rgb {
    let mut rng = StdRng::seed_from_u64(id.0 as u64);
    [
        rng.gen_range(32..=255),
        rng.gen_range(32..=255),
        rng.gen_range(32..=255),
    ]
}

fn to_index(i: usize) -> Result<u32> {
    u32::try_from(i)
        .map_err(|_| Error::InvalidData(format!("Vertex index {} exceeds u32 range", i)))
}

impl HalfEdgeMesh {
    fn face_color(&self, f: FaceHandle) -> Rgb {
        match self.faces[f].region {
            Some(id) if id.0 < self.regions.len() => region_color(id),
            _ => DEFAULT_COLOR,
        }
    }

    /// Flatten the mesh into exactly sized buffers.
    ///
    /// Every vertex is written in arena order with its negated normal.
    /// Vertex colours come from the faces using the vertex: grey outside of
    /// any region, a per-region colour otherwise. Fails when the vertex
    /// count does not fit a `u32` index.
    pub fn finalize(&self) -> Result<MeshBuffer> {
        let vertex_count = self.vertices.len();
        let face_count = self.faces.len();

        let mut index_of: SecondaryMap<VertexHandle, u32> =
            SecondaryMap::with_capacity(vertex_count);
        let mut vertices = Vec::with_capacity(3 * vertex_count);
        let mut normals = Vec::with_capacity(3 * vertex_count);
        let mut colors = Vec::with_capacity(3 * vertex_count);
        let mut indices = Vec::with_capacity(3 * face_count);

        for (i, (v, vertex)) in self.vertices.iter().enumerate() {
            index_of.insert(v, to_index(i)?);
            vertices.extend_from_slice(&[vertex.position.x, vertex.position.y, vertex.position.z]);
            normals.extend_from_slice(&[-vertex.normal.x, -vertex.normal.y, -vertex.normal.z]);
            colors.extend_from_slice(&DEFAULT_COLOR);
        }

        for f in self.faces.keys() {
            let color = self.face_color(f);
            for v in self.face_vertices(f) {
                let i = index_of[v];
                indices.push(i);
                let at = 3 * i as usize;
                colors[at..at + 3].copy_from_slice(&color);
            }
        }

        info!(vertices = vertex_count, faces = face_count, "Finalized mesh");
        Ok(MeshBuffer {
            vertices,
            normals,
            colors,
            indices,
            ..Default::default()
        })
    }

    /// Flatten the mesh, replacing every planar region by a fresh
    /// tessellation of its outline with a projected texture.
    ///
    /// Faces outside planar regions are copied one by one. A planar region
    /// whose outline cannot be extracted, tessellated or textured is copied
    /// face by face as well.
    pub fn finalize_and_retessellate<T, P>(
        &self,
        tessellator: &T,
        projector: &mut P,
    ) -> Result<MeshBuffer>
    where
        T: Tessellator + ?Sized,
        P: TextureProjector + ?Sized,
    {
        let mut out = RetessellatedBuffers::new(self.vertices.len(), self.faces.len());

        let copied: Vec<FaceHandle> = self
            .faces
            .iter()
            .filter(|(_, face)| {
                face.region
                    .and_then(|r| self.regions.get(r.0))
                    .map_or(true, |region| !region.is_in_plane())
            })
            .map(|(f, _)| f)
            .collect();
        for f in copied {
            out.copy_face(self, f)?;
        }

        let mut retessellated = 0;
        for region in &self.regions {
            let Some(plane) = region.plane else {
                continue;
            };
            match self.retessellate_region(region, &plane, tessellator, projector) {
                Ok((patch, projection)) => {
                    out.push_patch(&patch, &projection)?;
                    retessellated += 1;
                }
                Err(e) => {
                    warn!(region = region.id.0, error = %e, "Retessellation failed, copying faces");
                    for &f in &region.faces {
                        if self.faces.contains_key(f) {
                            out.copy_face(self, f)?;
                        }
                    }
                }
            }
        }

        let buffer = out.into_buffer();
        info!(
            vertices = buffer.vertex_count(),
            faces = buffer.face_count(),
            regions = retessellated,
            "Finalized mesh with retessellation"
        );
        Ok(buffer)
    }

    fn retessellate_region<T, P>(
        &self,
        region: &Region,
        plane: &Plane,
        tessellator: &T,
        projector: &mut P,
    ) -> Result<(TessellatedPatch, TextureProjection)>
    where
        T: Tessellator + ?Sized,
        P: TextureProjector + ?Sized,
    {
        let contours = self.region_contours(region)?;
        let color = region_color(region.id);

        let patch = tessellator.tessellate(&contours, plane, color)?;
        if patch.is_empty() {
            return Err(Error::Tessellation(format!(
                "Region {} produced no triangles",
                region.id.0
            )));
        }
        let projection = projector.project(region.id.0, plane, &contours, color)?;
        debug!(
            region = region.id.0,
            contours = contours.len(),
            triangles = patch.indices.len(),
            "Retessellated region"
        );
        Ok((patch, projection))
    }

    /// Closed outlines of a region, as rings of vertex positions.
    ///
    /// An outline edge is a region edge whose twin lies on the mesh boundary
    /// or in another region.
    pub fn region_contours(&self, region: &Region) -> Result<Vec<Vec<Point3f>>> {
        let mut leaving: SecondaryMap<VertexHandle, Vec<EdgeHandle>> = SecondaryMap::new();
        let mut outline = Vec::new();
        for &f in &region.faces {
            let Some(face) = self.faces.get(f) else {
                continue;
            };
            for e in self.face_edges(f) {
                let edge = &self.edges[e];
                let across = self.edges[edge.pair].face.map(|g| self.faces[g].region);
                if across == Some(face.region) {
                    continue;
                }
                outline.push(e);
                if let Some(list) = leaving.get_mut(edge.start) {
                    list.push(e);
                } else {
                    leaving.insert(edge.start, vec![e]);
                }
            }
        }

        let mut used = EdgeSet::new();
        let mut contours = Vec::new();
        for start in outline {
            if used.contains(start) {
                continue;
            }
            let origin = self.edges[start].start;
            let mut ring = Vec::new();
            let mut current = start;
            loop {
                used.insert(current);
                let edge = &self.edges[current];
                ring.push(self.vertices[edge.start].position);
                if edge.end == origin {
                    break;
                }
                let next = leaving
                    .get(edge.end)
                    .and_then(|list| list.iter().copied().find(|&h| !used.contains(h)));
                match next {
                    Some(h) => current = h,
                    None => {
                        return Err(Error::Algorithm(format!(
                            "Outline of region {} is not closed",
                            region.id.0
                        )))
                    }
                }
            }
            contours.push(ring);
        }

        if contours.is_empty() {
            return Err(Error::Algorithm(format!("Region {} has no outline", region.id.0)));
        }
        Ok(contours)
    }
}

/// Output buffers of the retessellating finalizer
struct RetessellatedBuffers {
    vertices: GrowBuffer<f32>,
    normals: GrowBuffer<f32>,
    colors: GrowBuffer<u8>,
    texture_coords: GrowBuffer<f32>,
    indices: GrowBuffer<u32>,
    triangle_textures: GrowBuffer<u32>,
    texture_ids: Vec<u32>,
    textures: Vec<Texture>,
    index_of: SecondaryMap<VertexHandle, u32>,
}

impl RetessellatedBuffers {
    fn new(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: GrowBuffer::with_capacity(3 * vertex_count),
            normals: GrowBuffer::with_capacity(3 * vertex_count),
            colors: GrowBuffer::with_capacity(3 * vertex_count),
            texture_coords: GrowBuffer::with_capacity(2 * vertex_count),
            indices: GrowBuffer::with_capacity(3 * face_count),
            triangle_textures: GrowBuffer::with_capacity(face_count),
            texture_ids: Vec::new(),
            textures: Vec::new(),
            index_of: SecondaryMap::with_capacity(vertex_count),
        }
    }

    fn next_index(&self) -> Result<u32> {
        to_index(self.vertices.len() / 3)
    }

    fn push_vertex(&mut self, position: &Point3f, normal: &Vector3f, color: Rgb, uv: [f32; 2]) {
        self.vertices.extend_from_slice(&[position.x, position.y, position.z]);
        self.normals.extend_from_slice(&[-normal.x, -normal.y, -normal.z]);
        self.colors.extend_from_slice(&color);
        self.texture_coords.extend_from_slice(&uv);
    }

    fn copy_face(&mut self, mesh: &HalfEdgeMesh, f: FaceHandle) -> Result<()> {
        let color = mesh.face_color(f);
        for v in mesh.face_vertices(f) {
            let index = match self.index_of.get(v) {
                Some(&i) => i,
                None => {
                    let i = self.next_index()?;
                    let vertex = &mesh.vertices[v];
                    self.push_vertex(&vertex.position, &vertex.normal, color, [0.0, 0.0]);
                    self.index_of.insert(v, i);
                    i
                }
            };
            self.indices.push(index);
        }
        self.triangle_textures.push(NO_TEXTURE);
        Ok(())
    }

    fn push_patch(
        &mut self,
        patch: &TessellatedPatch,
        projection: &TextureProjection,
    ) -> Result<()> {
        let count = patch.vertices.len();
        if let Some(&corner) = patch.indices.iter().flatten().find(|&&c| c >= count) {
            return Err(Error::Tessellation(format!(
                "Patch index {} out of range for {} vertices",
                corner, count
            )));
        }

        let base = self.next_index()?;
        for (i, position) in patch.vertices.iter().enumerate() {
            let normal = patch.normals.get(i).copied().unwrap_or_else(Vector3f::zeros);
            let color = patch.colors.get(i).copied().unwrap_or(DEFAULT_COLOR);
            let uv = projection.mapping.tex_coords(position);
            self.push_vertex(position, &normal, color, uv);
        }

        let texture_id = projection.texture.id;
        for triangle in &patch.indices {
            for &corner in triangle {
                self.indices.push(base + to_index(corner)?);
            }
            self.triangle_textures.push(texture_id);
        }
        self.texture_ids.push(texture_id);
        self.textures.push(projection.texture.clone());
        Ok(())
    }

    fn into_buffer(self) -> MeshBuffer {
        MeshBuffer {
            vertices: self.vertices.into_trimmed(),
            normals: self.normals.into_trimmed(),
            colors: self.colors.into_trimmed(),
            indices: self.indices.into_trimmed(),
            texture_coords: Some(self.texture_coords.into_trimmed()),
            triangle_textures: Some(self.triangle_textures.into_trimmed()),
            texture_ids: Some(self.texture_ids),
            textures: self.textures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use hedgecrate_core::UvMapping;

    /// Fans the first contour from its first point
    struct FanTessellator;

    impl Tessellator for FanTessellator {
        fn tessellate(
            &self,
            contours: &[Vec<Point3f>],
            plane: &Plane,
            color: Rgb,
        ) -> Result<TessellatedPatch> {
            let ring = &contours[0];
            Ok(TessellatedPatch {
                vertices: ring.clone(),
                normals: vec![plane.normal; ring.len()],
                colors: vec![color; ring.len()],
                indices: (1..ring.len() - 1).map(|i| [0, i, i + 1]).collect(),
            })
        }
    }

    struct FailingTessellator;

    impl Tessellator for FailingTessellator {
        fn tessellate(&self, _: &[Vec<Point3f>], _: &Plane, _: Rgb) -> Result<TessellatedPatch> {
            Err(Error::Tessellation("unsupported outline".to_string()))
        }
    }

    struct SolidProjector;

    impl TextureProjector for SolidProjector {
        fn project(
            &mut self,
            region_id: usize,
            plane: &Plane,
            _: &[Vec<Point3f>],
            color: Rgb,
        ) -> Result<TextureProjection> {
            Ok(TextureProjection {
                texture: Texture {
                    id: region_id as u32,
                    width: 1,
                    height: 1,
                    data: color.to_vec(),
                },
                mapping: UvMapping {
                    origin: plane.support,
                    u_axis: Vector3f::x(),
                    v_axis: Vector3f::y(),
                },
            })
        }
    }

    #[test]
    fn test_finalize_buffer_sizes() {
        let mesh = make_plane_grid(4);
        let buffer = mesh.finalize().unwrap();

        assert_eq!(buffer.vertices.len(), 3 * mesh.vertex_count());
        assert_eq!(buffer.normals.len(), 3 * mesh.vertex_count());
        assert_eq!(buffer.colors.len(), 3 * mesh.vertex_count());
        assert_eq!(buffer.indices.len(), 3 * mesh.face_count());
        assert!(buffer.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
        assert!(buffer.texture_coords.is_none());
    }

    #[test]
    fn test_finalize_after_deletions() {
        let mut mesh = make_octahedron();
        let top = mesh.vertex_by_index(4).unwrap();
        mesh.delete_vertex(top);
        let buffer = mesh.finalize().unwrap();

        assert_eq!(buffer.vertex_count(), 5);
        assert_eq!(buffer.face_count(), 4);
        assert!(buffer.indices.iter().all(|&i| (i as usize) < 5));
    }

    #[test]
    fn test_finalize_negates_normals_and_colors_regions() {
        let mut mesh = make_plane_grid(8);
        let plain = mesh.finalize().unwrap();
        // Default vertex normals point along +Z
        assert_eq!(&plain.normals[0..3], &[0.0, 0.0, -1.0]);
        assert_eq!(&plain.colors[0..3], &DEFAULT_COLOR);

        mesh.optimize_planes(1, 0.85, 1, 1, false);
        let colored = mesh.finalize().unwrap();
        assert_eq!(&colored.colors[0..3], &region_color(RegionId(0)));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_vertex_index_range() {
        assert_eq!(to_index(7).unwrap(), 7);
        assert_eq!(to_index(u32::MAX as usize).unwrap(), u32::MAX);
        assert!(to_index(u32::MAX as usize + 1).is_err());
    }

    #[test]
    fn test_region_color_is_stable() {
        assert_eq!(region_color(RegionId(3)), region_color(RegionId(3)));
        assert_ne!(region_color(RegionId(3)), region_color(RegionId(4)));
    }

    #[test]
    fn test_region_contours_of_flat_grid() {
        let mut mesh = make_plane_grid(8);
        mesh.optimize_planes(1, 0.85, 1, 1, false);
        let contours = mesh.region_contours(&mesh.regions()[0]).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 28);
    }

    #[test]
    fn test_region_contours_along_crease() {
        let mut mesh = make_folded_grid(8);
        mesh.optimize_planes(1, 0.85, 1, 1, false);
        assert_eq!(mesh.regions().len(), 2);
        for region in mesh.regions() {
            let contours = mesh.region_contours(region).unwrap();
            assert_eq!(contours.len(), 1);
            assert_eq!(contours[0].len(), 28);
        }
    }

    #[test]
    fn test_retessellate_planar_region() {
        let mut mesh = make_plane_grid(8);
        mesh.optimize_planes(1, 0.85, 1, 1, false);
        let buffer = mesh
            .finalize_and_retessellate(&FanTessellator, &mut SolidProjector)
            .unwrap();

        assert_eq!(buffer.vertex_count(), 28);
        assert_eq!(buffer.face_count(), 26);
        assert_eq!(buffer.texture_coords.as_ref().unwrap().len(), 2 * 28);
        assert_eq!(buffer.texture_ids.as_deref(), Some(&[0][..]));
        assert_eq!(buffer.textures.len(), 1);
        assert!(buffer
            .triangle_textures
            .as_ref()
            .unwrap()
            .iter()
            .all(|&t| t == 0));
        assert!(buffer.indices.iter().all(|&i| (i as usize) < 28));
    }

    #[test]
    fn test_retessellate_falls_back_to_copy() {
        let mut mesh = make_plane_grid(8);
        mesh.optimize_planes(1, 0.85, 1, 1, false);
        let buffer = mesh
            .finalize_and_retessellate(&FailingTessellator, &mut SolidProjector)
            .unwrap();

        assert_eq!(buffer.vertex_count(), 64);
        assert_eq!(buffer.face_count(), 98);
        assert!(buffer.texture_ids.as_ref().unwrap().is_empty());
        assert!(buffer
            .triangle_textures
            .as_ref()
            .unwrap()
            .iter()
            .all(|&t| t == NO_TEXTURE));
    }

    #[test]
    fn test_retessellate_without_regions_copies_everything() {
        let mesh = make_tetrahedron();
        let buffer = mesh
            .finalize_and_retessellate(&FanTessellator, &mut SolidProjector)
            .unwrap();
        assert_eq!(buffer.vertex_count(), 4);
        assert_eq!(buffer.face_count(), 4);
        assert_eq!(buffer.texture_coords.as_ref().unwrap().len(), 8);
    }
}
