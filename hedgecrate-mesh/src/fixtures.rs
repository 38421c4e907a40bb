//! Test meshes shared by the unit tests

use hedgecrate_core::Point3f;

use crate::HalfEdgeMesh;

fn build(vertices: &[Point3f], faces: &[[usize; 3]]) -> HalfEdgeMesh {
    let mut mesh = HalfEdgeMesh::new();
    for v in vertices {
        mesh.add_vertex(*v);
    }
    for f in faces {
        mesh.add_triangle(f[0], f[1], f[2]).unwrap();
    }
    mesh
}

/// Closed, consistently wound tetrahedron
pub(crate) fn make_tetrahedron() -> HalfEdgeMesh {
    build(
        &[
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.5, 1.0, 0.0),
            Point3f::new(0.5, 0.5, 1.0),
        ],
        &[[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
}

/// Closed octahedron with outward normals; vertex 4 is the top apex
pub(crate) fn make_octahedron() -> HalfEdgeMesh {
    build(
        &[
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(-1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, -1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
            Point3f::new(0.0, 0.0, -1.0),
        ],
        &[
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ],
    )
}

/// Triangles (A, B, C) and (A, C, D) sharing the diagonal A-C of the unit square
pub(crate) fn make_two_triangles() -> HalfEdgeMesh {
    build(
        &[
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ],
        &[[0, 1, 2], [0, 2, 3]],
    )
}

/// Flat `size` x `size` vertex grid in the z = 0 plane
pub(crate) fn make_plane_grid(size: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::new();
    for y in 0..size {
        for x in 0..size {
            vertices.push(Point3f::new(x as f32, y as f32, 0.0));
        }
    }
    build(&vertices, &grid_faces(size, 0))
}

pub(crate) fn grid_faces(size: usize, offset: usize) -> Vec<[usize; 3]> {
    let mut faces = Vec::new();
    for y in 0..(size - 1) {
        for x in 0..(size - 1) {
            let tl = offset + y * size + x;
            let tr = tl + 1;
            let bl = offset + (y + 1) * size + x;
            let br = bl + 1;
            faces.push([tl, bl, tr]);
            faces.push([tr, bl, br]);
        }
    }
    faces
}

/// Two flat grids meeting at a right angle along the line y = 0, z = 0:
/// a floor in z = 0 (y >= 0) and a wall in y = 0 (z >= 0), sharing the
/// crease vertices.
pub(crate) fn make_folded_grid(size: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::new();
    for y in 0..size {
        for x in 0..size {
            vertices.push(Point3f::new(x as f32, y as f32, 0.0));
        }
    }
    // Wall rows reuse the floor's y = 0 row as their first row
    for z in 1..size {
        for x in 0..size {
            vertices.push(Point3f::new(x as f32, 0.0, z as f32));
        }
    }

    let mut faces = grid_faces(size, 0);
    let wall_row = |z: usize, x: usize| {
        if z == 0 {
            x
        } else {
            size * size + (z - 1) * size + x
        }
    };
    for z in 0..(size - 1) {
        for x in 0..(size - 1) {
            let a = wall_row(z, x);
            let b = wall_row(z, x + 1);
            let c = wall_row(z + 1, x);
            let d = wall_row(z + 1, x + 1);
            faces.push([a, b, c]);
            faces.push([b, d, c]);
        }
    }
    build(&vertices, &faces)
}
