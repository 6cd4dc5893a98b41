//! Mesh and material conversion for rendering globe nodes in Bevy.
//!
//! Converts the engine's merged bar geometry (positions, normals, triangle
//! list) to Bevy's mesh format, and node descriptions to `StandardMaterial`s.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use zilch_globe::{BarMaterial, CloudShell, DistributionMesh, EarthNode};

/// Convert the merged bar geometry to a Bevy mesh.
///
/// Bars are flat shaded, so every face carries its own normals.
pub fn distribution_mesh(distribution: &DistributionMesh) -> Mesh {
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, distribution.positions().to_vec());
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, distribution.normals().to_vec());
    mesh.insert_indices(Indices::U32(distribution.indices().to_vec()));
    mesh
}

/// UV sphere for the earth and its cloud shells.
pub fn sphere_mesh(radius: f32, segments: u32) -> Mesh {
    Sphere::new(radius).mesh().uv(segments, segments)
}

pub fn srgb(rgb: [f32; 3]) -> Color {
    Color::srgb(rgb[0], rgb[1], rgb[2])
}

/// Translucent material shared by every bar.
pub fn bar_material(material: &BarMaterial) -> StandardMaterial {
    let [r, g, b] = material.color;
    StandardMaterial {
        base_color: Color::srgba(r, g, b, material.opacity),
        emissive: srgb(material.emissive).to_linear(),
        alpha_mode: AlphaMode::Blend,
        ..default()
    }
}

/// Textured earth surface. Low shininess maps to a rough surface.
pub fn earth_material(earth: &EarthNode, texture: Handle<Image>) -> StandardMaterial {
    StandardMaterial {
        base_color_texture: Some(texture),
        perceptual_roughness: (1.0 - earth.shininess).clamp(0.089, 1.0),
        reflectance: 0.1,
        ..default()
    }
}

/// Alpha-blended cloud layer.
pub fn cloud_material(shell: &CloudShell, texture: Handle<Image>) -> StandardMaterial {
    StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, shell.opacity),
        base_color_texture: Some(texture),
        alpha_mode: AlphaMode::Blend,
        perceptual_roughness: 1.0,
        ..default()
    }
}
