//! Mesh pipeline demo
//!
//! Generates a noisy room corner (floor and two walls) with holes and
//! loose fragments, runs the full optimisation pipeline on it and prints
//! what every pass did.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use hedgecrate_core::{Point3f, Vector3f};
use hedgecrate_mesh::{HalfEdgeMesh, MeshPipeline, PipelineConfig, PipelineReport};
use hedgecrate_tessellation::{ConstrainedTessellator, PlanarTextureProjector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Run the hedgecrate mesh pipeline on a generated scene
#[derive(Parser)]
#[command(name = "mesh_pipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Clean, segment and finalize a reconstructed room corner", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Pipeline configuration in TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vertices along each side of a sheet
    #[arg(long, default_value_t = 24)]
    size: usize,

    /// Amplitude of the positional noise
    #[arg(long, default_value_t = 0.01)]
    noise: f32,

    /// Number of faces punched out of the sheets
    #[arg(long, default_value_t = 12)]
    holes: usize,

    /// Seed of the scene generator
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Retessellate planar regions regardless of the configuration
    #[arg(long)]
    retessellate: bool,

    /// Texel edge length of projected textures
    #[arg(long, default_value_t = 0.05)]
    pixel_size: f32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str::<PipelineConfig>(&text)
                .with_context(|| format!("Invalid pipeline configuration in {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };
    if cli.retessellate {
        config = config.with_retessellation(true);
    }
    let pipeline = MeshPipeline::new(config)?;

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let mut mesh = room_corner(cli.size.max(3), cli.noise, &mut rng)?;
    punch_holes(&mut mesh, cli.holes, &mut rng);
    info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "Generated scene"
    );

    let tessellator = ConstrainedTessellator::default();
    let mut projector = PlanarTextureProjector::new(cli.pixel_size)?;
    let report = pipeline.run(&mut mesh, &tessellator, &mut projector)?;
    print_report(&report);
    Ok(())
}

/// Floor in z = 0, a wall in y = 0 and a wall in x = 0, each `size` x `size`
/// vertices and sharing their seams, plus a few loose triangles floating
/// above the floor
fn room_corner(size: usize, noise: f32, rng: &mut StdRng) -> anyhow::Result<HalfEdgeMesh> {
    let mut mesh = HalfEdgeMesh::new();
    let mut index_of: HashMap<[usize; 3], usize> = HashMap::new();
    let sheets: [fn(usize, usize) -> [usize; 3]; 3] = [
        |u, v| [u, v, 0],
        |u, v| [v, 0, u],
        |u, v| [0, u, v],
    ];
    for sheet in sheets {
        let mut grid = Vec::with_capacity(size * size);
        for j in 0..size {
            for i in 0..size {
                let cell = sheet(i, j);
                let index = *index_of.entry(cell).or_insert_with(|| {
                    let [x, y, z] = cell.map(|c| c as f32);
                    let shift = Vector3f::new(
                        jitter(rng, noise),
                        jitter(rng, noise),
                        jitter(rng, noise),
                    );
                    mesh.add_vertex(Point3f::new(x, y, z) + shift);
                    mesh.vertex_count() - 1
                });
                grid.push(index);
            }
        }
        for j in 0..(size - 1) {
            for i in 0..(size - 1) {
                let a = j * size + i;
                let c = a + size;
                mesh.add_triangle(grid[a], grid[a + 1], grid[c])?;
                mesh.add_triangle(grid[a + 1], grid[c + 1], grid[c])?;
            }
        }
    }

    // Reconstruction debris
    let lift = size as f32 * 0.5;
    for k in 0..3 {
        let offset = mesh.vertex_count();
        let base = Point3f::new(2.0 + k as f32, 2.0, lift);
        mesh.add_vertex(base);
        mesh.add_vertex(base + Vector3f::new(0.5, 0.0, 0.1));
        mesh.add_vertex(base + Vector3f::new(0.0, 0.5, 0.2));
        mesh.add_triangle(offset, offset + 1, offset + 2)?;
    }
    Ok(mesh)
}

fn jitter(rng: &mut StdRng, noise: f32) -> f32 {
    if noise > 0.0 {
        rng.gen_range(-noise..noise)
    } else {
        0.0
    }
}

/// Delete up to `count` random faces that are surrounded by other faces
fn punch_holes(mesh: &mut HalfEdgeMesh, count: usize, rng: &mut StdRng) {
    for _ in 0..count {
        let interior: Vec<_> = mesh
            .face_handles()
            .filter(|&f| mesh.face_neighbors(f).iter().all(Option::is_some))
            .collect();
        if interior.is_empty() {
            break;
        }
        let f = interior[rng.gen_range(0..interior.len())];
        mesh.delete_face(f);
    }
}

fn print_report(report: &PipelineReport) {
    println!("Mesh pipeline report");
    println!("====================");
    println!("Artifact faces removed:   {}", report.artifact_faces_removed);
    println!("Contour faces removed:    {}", report.contour_faces_removed);
    println!("Hole faces added:         {}", report.hole_faces_added);
    println!("Regions:                  {}", report.segmentation.regions);
    println!("Planar regions:           {}", report.segmentation.planes);
    println!("Small region faces:       {}", report.segmentation.small_faces_removed);
    println!("Flickering faces:         {}", report.segmentation.flickering_removed);
    println!("Snapped intersections:    {}", report.snapped_intersections);
    println!("Restored vertices:        {}", report.restored_vertices);
    println!(
        "Output:                   {} vertices, {} triangles, {} textures",
        report.buffer.vertex_count(),
        report.buffer.face_count(),
        report.buffer.textures.len()
    );
    println!("Processing time:          {:.3}s", report.processing_time);
}
