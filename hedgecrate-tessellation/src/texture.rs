//! Flat texture projection for planar regions

use hedgecrate_core::{
    Error, Plane, Point3f, Result, Rgb, Texture, TextureProjection, TextureProjector, UvMapping,
};
use tracing::debug;

/// Projects planar regions onto axis-aligned textures in the plane basis.
///
/// The texture covers the bounding rectangle of the region's contours with
/// one texel per `pixel_size` plane units and is filled with the region
/// colour. Texture ids are handed out sequentially.
#[derive(Debug, Clone)]
pub struct PlanarTextureProjector {
    pixel_size: f32,
    max_texture_size: u32,
    next_id: u32,
}

impl Default for PlanarTextureProjector {
    fn default() -> Self {
        Self {
            pixel_size: 0.05,
            max_texture_size: 4096,
            next_id: 0,
        }
    }
}

impl PlanarTextureProjector {
    /// Create a projector with the given texel edge length
    pub fn new(pixel_size: f32) -> Result<Self> {
        if !(pixel_size > 0.0) {
            return Err(Error::invalid_param("pixel_size", pixel_size, "must be positive"));
        }
        Ok(Self {
            pixel_size,
            ..Self::default()
        })
    }

    /// Clamp texture width and height to `size` texels
    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size.max(1);
        self
    }

    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    fn texels(&self, extent: f64) -> u32 {
        let count = (extent / self.pixel_size as f64).ceil();
        (count as u32).clamp(1, self.max_texture_size)
    }
}

impl TextureProjector for PlanarTextureProjector {
    fn project(
        &mut self,
        region_id: usize,
        plane: &Plane,
        contours: &[Vec<Point3f>],
        color: Rgb,
    ) -> Result<TextureProjection> {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for p in contours.iter().flatten() {
            let local = plane.to_local(p);
            for k in 0..2 {
                min[k] = min[k].min(local[k]);
                max[k] = max[k].max(local[k]);
            }
        }
        let extent = [max[0] - min[0], max[1] - min[1]];
        if !(extent[0] > 0.0 && extent[1] > 0.0) {
            return Err(Error::Algorithm(format!(
                "Region {} has no area to texture",
                region_id
            )));
        }

        let (width, height) = (self.texels(extent[0]), self.texels(extent[1]));
        let data = color
            .iter()
            .copied()
            .cycle()
            .take(3 * width as usize * height as usize)
            .collect();

        let (u, v) = plane.basis();
        let mapping = UvMapping {
            origin: plane.from_local(min),
            u_axis: u / extent[0] as f32,
            v_axis: v / extent[1] as f32,
        };

        let id = self.next_id;
        self.next_id += 1;
        debug!(region = region_id, texture = id, width, height, "Projected texture");

        Ok(TextureProjection {
            texture: Texture {
                id,
                width,
                height,
                data,
            },
            mapping,
        })
    }
}
