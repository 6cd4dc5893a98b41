//! Extruded density bars merged into a single mesh.
//!
//! Every record becomes a square-footprint box standing on the globe at its
//! projected anchor, long axis pointing away from the sphere centre. All boxes
//! share one vertex/index buffer and one material, so the draw-call count does
//! not depend on the number of records.

use glam::{Quat, Vec3};

use crate::config::BarConfig;
use crate::density::DensityRecord;
use crate::projection::project;

/// Vertices emitted per bar (four per face, flat shaded).
pub const VERTICES_PER_BAR: usize = 24;
/// Indices emitted per bar (two triangles per face).
pub const INDICES_PER_BAR: usize = 36;

/// Placement of one bar inside the merged mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarPrimitive {
    /// Centre of the bar base, on the projected surface point.
    pub anchor: Vec3,
    /// Unit vector from the sphere centre through the anchor.
    pub direction: Vec3,
    /// Radial extent of the bar.
    pub height: f32,
}

/// Material shared by every bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarMaterial {
    pub color: [f32; 3],
    pub emissive: [f32; 3],
    pub opacity: f32,
}

impl From<&BarConfig> for BarMaterial {
    fn from(config: &BarConfig) -> Self {
        Self {
            color: crate::config::unpack_rgb(config.color),
            emissive: crate::config::unpack_rgb(config.emissive),
            opacity: config.opacity,
        }
    }
}

/// Merged bar geometry; a triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistributionMesh {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
    bars: Vec<BarPrimitive>,
}

impl DistributionMesh {
    /// A mesh with no geometry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of bars merged into the mesh.
    pub fn primitive_count(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bars(&self) -> &[BarPrimitive] {
        &self.bars
    }

    /// Vertex positions belonging to bar `index`, or `None` past the last bar.
    pub fn bar_vertices(&self, index: usize) -> Option<&[[f32; 3]]> {
        let start = index.checked_mul(VERTICES_PER_BAR)?;
        self.positions.get(start..start.checked_add(VERTICES_PER_BAR)?)
    }

    /// Append one bar's box geometry.
    fn push(&mut self, bar: BarPrimitive, footprint: f32) {
        #[allow(clippy::cast_possible_truncation)]
        let base = self.positions.len() as u32;
        let rotation = Quat::from_rotation_arc(Vec3::Z, bar.direction);
        let half = footprint / 2.0;

        // Local frame: footprint in XY, extrusion along +Z from the base.
        for (normal, corners) in box_faces(half, bar.height) {
            let world_normal = (rotation * normal).to_array();
            for corner in corners {
                self.positions.push((bar.anchor + rotation * corner).to_array());
                self.normals.push(world_normal);
            }
        }

        for face in 0..6u32 {
            let f = base + face * 4;
            self.indices.extend([f, f + 1, f + 2, f, f + 2, f + 3]);
        }

        self.bars.push(bar);
    }
}

/// The six faces of a box spanning `[-half, half]²` in XY and `[0, height]` in
/// Z, each as an outward normal and four counter-clockwise corners.
fn box_faces(half: f32, height: f32) -> [(Vec3, [Vec3; 4]); 6] {
    let (h, z) = (half, height);
    [
        (
            Vec3::Z,
            [
                Vec3::new(-h, -h, z),
                Vec3::new(h, -h, z),
                Vec3::new(h, h, z),
                Vec3::new(-h, h, z),
            ],
        ),
        (
            Vec3::NEG_Z,
            [
                Vec3::new(-h, h, 0.0),
                Vec3::new(h, h, 0.0),
                Vec3::new(h, -h, 0.0),
                Vec3::new(-h, -h, 0.0),
            ],
        ),
        (
            Vec3::X,
            [
                Vec3::new(h, -h, 0.0),
                Vec3::new(h, h, 0.0),
                Vec3::new(h, h, z),
                Vec3::new(h, -h, z),
            ],
        ),
        (
            Vec3::NEG_X,
            [
                Vec3::new(-h, h, 0.0),
                Vec3::new(-h, -h, 0.0),
                Vec3::new(-h, -h, z),
                Vec3::new(-h, h, z),
            ],
        ),
        (
            Vec3::Y,
            [
                Vec3::new(h, h, 0.0),
                Vec3::new(-h, h, 0.0),
                Vec3::new(-h, h, z),
                Vec3::new(h, h, z),
            ],
        ),
        (
            Vec3::NEG_Y,
            [
                Vec3::new(-h, -h, 0.0),
                Vec3::new(h, -h, 0.0),
                Vec3::new(h, -h, z),
                Vec3::new(-h, -h, z),
            ],
        ),
    ]
}

/// Builds a [`DistributionMesh`] from density records.
#[derive(Debug, Clone, Copy)]
pub struct DistributionMeshBuilder {
    config: BarConfig,
    earth_radius: f32,
}

impl DistributionMeshBuilder {
    pub fn new(config: BarConfig, earth_radius: f32) -> Self {
        Self {
            config,
            earth_radius,
        }
    }

    /// Bar height for a count: `min_height + count / count_scale`.
    #[allow(clippy::cast_precision_loss)]
    pub fn bar_height(&self, count: u32) -> f32 {
        self.config.min_height + count as f32 / self.config.count_scale
    }

    /// Place a single record, or `None` if it cannot be projected.
    pub fn primitive(&self, record: &DensityRecord) -> Option<BarPrimitive> {
        if !record.is_valid() {
            return None;
        }
        let anchor = project(
            record.latitude,
            record.longitude,
            f64::from(self.earth_radius),
            f64::from(self.config.elevation),
        );
        Some(BarPrimitive {
            anchor,
            direction: anchor.try_normalize()?,
            height: self.bar_height(record.count),
        })
    }

    /// Merge one bar per usable record into a single mesh.
    pub fn build(&self, records: &[DensityRecord]) -> DistributionMesh {
        let initial = DistributionMesh {
            positions: Vec::with_capacity(records.len() * VERTICES_PER_BAR),
            normals: Vec::with_capacity(records.len() * VERTICES_PER_BAR),
            indices: Vec::with_capacity(records.len() * INDICES_PER_BAR),
            bars: Vec::with_capacity(records.len()),
        };

        let mesh = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let primitive = self.primitive(record);
                if primitive.is_none() {
                    tracing::warn!(
                        index,
                        latitude = record.latitude,
                        longitude = record.longitude,
                        "Skipping density record that cannot be projected"
                    );
                }
                primitive
            })
            .fold(initial, |mut mesh, bar| {
                mesh.push(bar, self.config.footprint);
                mesh
            });

        tracing::debug!(
            "Built distribution mesh: {} bars, {} vertices",
            mesh.primitive_count(),
            mesh.positions.len()
        );

        mesh
    }

    /// Material shared by every bar of meshes from this builder.
    pub fn material(&self) -> BarMaterial {
        BarMaterial::from(&self.config)
    }
}
