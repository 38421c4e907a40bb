//! Configurable mesh optimisation pipeline
//!
//! Runs the cleanup, repair and segmentation passes of a reconstructed mesh
//! in a fixed order and finalizes the result into render buffers.

use std::time::Instant;

use hedgecrate_core::{Error, MeshBuffer, Result, Tessellator, TextureProjector};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::segmentation::SegmentationStats;
use crate::HalfEdgeMesh;

/// Configuration for the mesh optimisation pipeline.
///
/// A zero count disables the corresponding pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Connected pieces with fewer faces than this are deleted
    pub dangling_artifacts: usize,
    /// Number of contour cleanup iterations
    pub clean_contours: usize,
    /// Holes with at least this many boundary edges are left open
    pub fill_holes: usize,
    /// Number of region growing passes
    pub plane_iterations: usize,
    /// Cosine of the largest angle between a region's seed and member normals
    pub normal_threshold: f32,
    /// Regions need more faces than this to be fitted to a plane
    pub min_plane_size: usize,
    /// Regions with fewer faces are deleted after segmentation
    pub small_region_threshold: usize,
    /// Delete faces turned against their region plane
    pub remove_flickering: bool,
    /// Snap creases between planes onto their intersection lines
    pub optimize_intersections: bool,
    /// Replace planar regions by tessellated, textured patches
    pub retessellate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dangling_artifacts: 0,
            clean_contours: 0,
            fill_holes: 30,
            plane_iterations: 3,
            normal_threshold: 0.85,
            min_plane_size: 7,
            small_region_threshold: 10,
            remove_flickering: true,
            optimize_intersections: true,
            retessellate: false,
        }
    }
}

impl PipelineConfig {
    /// Only hole filling, no segmentation
    pub fn repair_only() -> Self {
        Self {
            plane_iterations: 0,
            optimize_intersections: false,
            ..Self::default()
        }
    }

    pub fn with_plane_iterations(mut self, iterations: usize) -> Self {
        self.plane_iterations = iterations;
        self
    }

    pub fn with_normal_threshold(mut self, threshold: f32) -> Self {
        self.normal_threshold = threshold;
        self
    }

    pub fn with_fill_holes(mut self, max_size: usize) -> Self {
        self.fill_holes = max_size;
        self
    }

    pub fn with_retessellation(mut self, enabled: bool) -> Self {
        self.retessellate = enabled;
        self
    }

    /// Check that all parameters are in range
    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.normal_threshold) {
            return Err(Error::invalid_param(
                "normal_threshold",
                self.normal_threshold,
                "must be a cosine in [-1, 1]",
            ));
        }
        if self.fill_holes > 0 && self.fill_holes < 4 {
            return Err(Error::invalid_param(
                "fill_holes",
                self.fill_holes,
                "must be 0 or at least 4 to fill triangular holes",
            ));
        }
        if self.plane_iterations == 0 && (self.optimize_intersections || self.retessellate) {
            return Err(Error::invalid_param(
                "plane_iterations",
                self.plane_iterations,
                "segmentation is required for intersection snapping and retessellation",
            ));
        }
        Ok(())
    }
}

/// Counts and output of a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub artifact_faces_removed: usize,
    pub contour_faces_removed: usize,
    pub hole_faces_added: usize,
    pub segmentation: SegmentationStats,
    pub snapped_intersections: usize,
    pub restored_vertices: usize,
    /// Processing time in seconds
    pub processing_time: f32,
    pub buffer: MeshBuffer,
}

/// The mesh optimisation pipeline
#[derive(Debug, Clone, Default)]
pub struct MeshPipeline {
    config: PipelineConfig,
}

impl MeshPipeline {
    /// Create a new pipeline, validating the configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every enabled pass on `mesh` and finalize it.
    ///
    /// Passes run in the order artifacts, contour cleanup, hole filling,
    /// plane optimisation, intersection snapping and plane restoration.
    pub fn run<T, P>(
        &self,
        mesh: &mut HalfEdgeMesh,
        tessellator: &T,
        projector: &mut P,
    ) -> Result<PipelineReport>
    where
        T: Tessellator + ?Sized,
        P: TextureProjector + ?Sized,
    {
        let config = &self.config;
        let start = Instant::now();
        let mut report = PipelineReport::default();
        info!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "Starting mesh pipeline"
        );

        if config.dangling_artifacts > 0 {
            report.artifact_faces_removed =
                mesh.remove_dangling_artifacts(config.dangling_artifacts);
        }
        if config.clean_contours > 0 {
            report.contour_faces_removed = mesh.clean_contours(config.clean_contours);
        }
        if config.fill_holes > 0 {
            report.hole_faces_added = mesh.fill_holes(config.fill_holes);
        }

        if config.plane_iterations > 0 {
            report.segmentation = mesh.optimize_planes(
                config.plane_iterations,
                config.normal_threshold,
                config.min_plane_size,
                config.small_region_threshold,
                config.remove_flickering,
            );
            if config.optimize_intersections {
                report.snapped_intersections = mesh.optimize_plane_intersections();
            }
            report.restored_vertices = mesh.restore_planes();
        }

        report.buffer = if config.retessellate {
            mesh.finalize_and_retessellate(tessellator, projector)?
        } else {
            mesh.finalize()?
        };

        report.processing_time = start.elapsed().as_secs_f32();
        info!(
            vertices = report.buffer.vertex_count(),
            faces = report.buffer.face_count(),
            seconds = report.processing_time,
            "Mesh pipeline finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use hedgecrate_core::{
        Plane, Point3f, Rgb, TessellatedPatch, Texture, TextureProjection, UvMapping, Vector3f,
    };

    struct Unused;

    impl Tessellator for Unused {
        fn tessellate(&self, _: &[Vec<Point3f>], _: &Plane, _: Rgb) -> Result<TessellatedPatch> {
            Err(Error::Unsupported("no tessellation".to_string()))
        }
    }

    impl TextureProjector for Unused {
        fn project(
            &mut self,
            _: usize,
            plane: &Plane,
            _: &[Vec<Point3f>],
            _: Rgb,
        ) -> Result<TextureProjection> {
            Ok(TextureProjection {
                texture: Texture {
                    id: 0,
                    width: 1,
                    height: 1,
                    data: vec![0, 0, 0],
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
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.normal_threshold, 0.85);
        assert_eq!(config.min_plane_size, 7);
        assert_eq!(config.small_region_threshold, 10);
        assert!(PipelineConfig::repair_only().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let config = PipelineConfig::default().with_normal_threshold(1.5);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidParameter { name: "normal_threshold", .. })
        ));

        let config = PipelineConfig::default().with_fill_holes(3);
        assert!(config.validate().is_err());

        let config = PipelineConfig::default().with_plane_iterations(0);
        assert!(MeshPipeline::new(config).is_err());
    }

    #[test]
    fn test_run_repairs_and_segments() {
        let mut mesh = make_octahedron();
        let f = mesh.face_handles().next().unwrap();
        mesh.delete_face(f);

        // Every octahedron face is a region of its own
        let config = PipelineConfig {
            small_region_threshold: 1,
            ..PipelineConfig::default()
        };
        let pipeline = MeshPipeline::new(config).unwrap();
        let report = pipeline.run(&mut mesh, &Unused, &mut Unused).unwrap();

        assert_eq!(report.hole_faces_added, 1);
        assert_eq!(report.segmentation.regions, 8);
        assert_eq!(report.segmentation.planes, 0);
        assert_eq!(mesh.face_count(), 8);
        assert_eq!(mesh.boundary_edge_count(), 0);
        assert_eq!(report.buffer.face_count(), mesh.face_count());
        assert_eq!(report.buffer.vertex_count(), mesh.vertex_count());
        assert!(report.buffer.texture_coords.is_none());
    }

    #[test]
    fn test_run_with_failing_tessellator_still_finalizes() {
        let mut mesh = make_plane_grid(8);
        // The grid's outer border is not a hole
        let config = PipelineConfig::default()
            .with_fill_holes(0)
            .with_retessellation(true);
        let pipeline = MeshPipeline::new(config).unwrap();
        let report = pipeline.run(&mut mesh, &Unused, &mut Unused).unwrap();

        assert_eq!(report.segmentation.planes, 1);
        assert_eq!(report.buffer.face_count(), 98);
        assert!(report.buffer.texture_coords.is_some());
    }
}
