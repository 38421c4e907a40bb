//! Basic usage example for hedgecrate
//!
//! This example demonstrates the mesh container and its operators:
//! - Building a mesh vertex by vertex and triangle by triangle
//! - Flipping and collapsing edges
//! - Finding and filling a hole
//! - Finalizing into flat buffers

use hedgecrate_core::Point3f;
use hedgecrate_mesh::HalfEdgeMesh;

fn main() -> anyhow::Result<()> {
    println!("hedgecrate Basic Usage Example");
    println!("==============================");

    // A 4 x 4 vertex grid in the z = 0 plane
    let size = 4;
    let mut mesh = HalfEdgeMesh::new();
    for y in 0..size {
        for x in 0..size {
            mesh.add_vertex(Point3f::new(x as f32, y as f32, 0.0));
        }
    }
    for y in 0..(size - 1) {
        for x in 0..(size - 1) {
            let tl = y * size + x;
            let bl = tl + size;
            mesh.add_triangle(tl, bl, tl + 1)?;
            mesh.add_triangle(tl + 1, bl, bl + 1)?;
        }
    }
    mesh.check_invariants()?;
    println!(
        "Created mesh with {} vertices, {} faces and {} boundary half-edges",
        mesh.vertex_count(),
        mesh.face_count(),
        mesh.boundary_edge_count()
    );

    // Flip the diagonal of the centre cell twice
    let (a, b) = (mesh.vertex_by_index(6), mesh.vertex_by_index(9));
    if let Some(diagonal) = a.zip(b).and_then(|(a, b)| mesh.find_edge(a, b)) {
        println!("\nOperators:");
        println!("- First flip applied: {}", mesh.flip_edge(diagonal));
        println!("- Second flip applied: {}", mesh.flip_edge(diagonal));
    }

    // Guarded collapse of an interior edge
    let (a, b) = (mesh.vertex_by_index(5), mesh.vertex_by_index(6));
    if let Some(edge) = a.zip(b).and_then(|(a, b)| mesh.find_edge(a, b)) {
        let collapsed = mesh.safe_collapse_edge(edge);
        println!(
            "- Safe collapse applied: {} ({} vertices, {} faces left)",
            collapsed,
            mesh.vertex_count(),
            mesh.face_count()
        );
    }

    // Punch a hole and repair it
    let interior = mesh
        .face_handles()
        .find(|&f| mesh.face_neighbors(f).iter().all(Option::is_some));
    if let Some(f) = interior {
        mesh.delete_face(f);
        println!("\nHoles:");
        println!("- Contours after deleting a face: {}", mesh.boundary_contours().len());
        println!("- Faces added by fill_holes: {}", mesh.fill_holes(10));
    }
    mesh.check_invariants()?;

    let buffer = mesh.finalize()?;
    println!(
        "\nFinalized buffer with {} vertices and {} triangles",
        buffer.vertex_count(),
        buffer.face_count()
    );

    println!("\nExample completed successfully!");
    Ok(())
}
