//! Benchmarks of the segmentation, hole filling and finalization passes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hedgecrate_core::{Point3f, TriangleMesh};
use hedgecrate_mesh::HalfEdgeMesh;

/// Grid with a flat half and a sine bump on the other half
fn generate_grid_mesh(size: usize) -> TriangleMesh {
    let mut vertices = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let fx = x as f32 / (size - 1) as f32 * std::f32::consts::PI;
            let fy = y as f32 / (size - 1) as f32 * std::f32::consts::PI;
            let z = if x < size / 2 { 0.0 } else { (fx.sin() * fy.sin()) * 2.0 };
            vertices.push(Point3f::new(x as f32, y as f32, z));
        }
    }
    let mut faces = Vec::with_capacity((size - 1) * (size - 1) * 2);
    for y in 0..(size - 1) {
        for x in 0..(size - 1) {
            let tl = y * size + x;
            let tr = tl + 1;
            let bl = (y + 1) * size + x;
            let br = bl + 1;
            faces.push([tl, bl, tr]);
            faces.push([tr, bl, br]);
        }
    }
    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

/// Same grid with every seventh face punched out
fn generate_holed_mesh(size: usize) -> HalfEdgeMesh {
    let mut mesh = HalfEdgeMesh::from_triangle_mesh(&generate_grid_mesh(size)).unwrap();
    let holes: Vec<_> = mesh.face_handles().step_by(7).skip(1).collect();
    for f in holes {
        mesh.delete_face(f);
    }
    mesh
}

fn bench_mesh_passes(c: &mut Criterion) {
    let sizes = [20, 40, 80];

    let mut group = c.benchmark_group("mesh_passes");

    for &size in &sizes {
        let source = generate_grid_mesh(size);
        let face_count = source.face_count();

        group.bench_with_input(
            BenchmarkId::new("optimize_planes", format!("{}f", face_count)),
            &source,
            |b, source| {
                b.iter(|| {
                    let mut mesh = HalfEdgeMesh::from_triangle_mesh(black_box(source)).unwrap();
                    let stats = mesh.optimize_planes(3, 0.85, 7, 10, true);
                    black_box(stats);
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("fill_holes", format!("{}f", face_count)),
            &size,
            |b, &size| {
                b.iter_with_setup(
                    || generate_holed_mesh(size),
                    |mut mesh| {
                        black_box(mesh.fill_holes(30));
                    },
                );
            },
        );

        let mesh = HalfEdgeMesh::from_triangle_mesh(&source).unwrap();
        group.bench_with_input(
            BenchmarkId::new("finalize", format!("{}f", face_count)),
            &mesh,
            |b, mesh| {
                b.iter(|| black_box(mesh.finalize().unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_mesh_passes);
criterion_main!(benches);
