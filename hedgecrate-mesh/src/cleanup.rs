//! Removal of fringe faces and small disconnected pieces

use tracing::{debug, info};

use crate::handle::{FaceHandle, FaceSet, RegionId};
use crate::region::Region;
use crate::HalfEdgeMesh;

impl HalfEdgeMesh {
    /// Delete faces with two or more boundary edges, `iterations` times.
    ///
    /// Each iteration peels the spikes and one-face-wide fringes off every
    /// boundary contour. Stops early once no such face remains. Returns the
    /// number of deleted faces.
    pub fn clean_contours(&mut self, iterations: usize) -> usize {
        let mut removed = 0;
        for iteration in 0..iterations {
            let fringe: Vec<FaceHandle> = self
                .faces
                .keys()
                .filter(|&f| {
                    self.face_neighbors(f)
                        .iter()
                        .filter(|neighbor| neighbor.is_none())
                        .count()
                        >= 2
                })
                .collect();
            if fringe.is_empty() {
                break;
            }

            for &f in &fringe {
                self.delete_face(f);
            }
            debug!(iteration, faces = fringe.len(), "Cleaned contours");
            removed += fringe.len();
        }
        info!(faces = removed, "Contour cleanup finished");
        removed
    }

    /// Delete every connected piece of the surface with fewer than
    /// `threshold` faces. Returns the number of deleted faces.
    pub fn remove_dangling_artifacts(&mut self, threshold: usize) -> usize {
        let mut visited = FaceSet::new();
        let mut artifacts = Vec::new();

        let seeds: Vec<FaceHandle> = self.faces.keys().collect();
        for seed in seeds {
            if visited.contains(seed) {
                continue;
            }
            let mut component = Region::new(RegionId(0));
            self.region_growing(seed, &mut visited, &mut component);
            if component.size() < threshold {
                artifacts.push(component);
            }
        }

        let mut removed = 0;
        for component in &artifacts {
            for &f in &component.faces {
                self.delete_face(f);
            }
            removed += component.size();
        }
        info!(
            components = artifacts.len(),
            faces = removed,
            "Removed dangling artifacts"
        );
        removed
    }
}
