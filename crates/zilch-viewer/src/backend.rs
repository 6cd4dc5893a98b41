//! Bevy implementation of the globe rendering backend.
//!
//! Registered nodes become entities tagged with [`GlobeNode`]; each frame only
//! their transforms are updated from the scene graph. Bevy draws whatever the
//! world contains, so `render` is a transform sync.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::render::renderer::RenderDevice;
use zilch_globe::config::ViewportConfig;
use zilch_globe::{BackendError, RenderBackend, SceneGraph, SceneNode};

use crate::mesh::{
    bar_material, cloud_material, distribution_mesh, earth_material, sphere_mesh, srgb,
};

/// Scale from the scene's unitless light intensity to lux.
const LUX_PER_INTENSITY: f32 = 2_000.0;

/// Which scene node an entity draws.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobeNode {
    Camera,
    Light,
    Earth,
    Cloud(usize),
    Distribution,
}

/// Assets created for the globe, freed on release.
#[derive(Resource, Default)]
pub struct GlobeAssets {
    meshes: Vec<Handle<Mesh>>,
    materials: Vec<Handle<StandardMaterial>>,
    images: Vec<Handle<Image>>,
    initialized: bool,
}

/// Draws a [`SceneGraph`] through the ECS.
#[derive(SystemParam)]
pub struct BevyBackend<'w, 's> {
    commands: Commands<'w, 's>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    images: ResMut<'w, Assets<Image>>,
    asset_server: Res<'w, AssetServer>,
    render_device: Option<Res<'w, RenderDevice>>,
    globe_assets: ResMut<'w, GlobeAssets>,
    nodes: Query<'w, 's, (Entity, &'static GlobeNode, &'static mut Transform)>,
}

impl BevyBackend<'_, '_> {
    fn add_mesh(&mut self, mesh: Mesh) -> Handle<Mesh> {
        let handle = self.meshes.add(mesh);
        self.globe_assets.meshes.push(handle.clone());
        handle
    }

    fn add_material(&mut self, material: StandardMaterial) -> Handle<StandardMaterial> {
        let handle = self.materials.add(material);
        self.globe_assets.materials.push(handle.clone());
        handle
    }

    fn load_image(&mut self, path: &str) -> Handle<Image> {
        let handle: Handle<Image> = self.asset_server.load(path.to_owned());
        self.globe_assets.images.push(handle.clone());
        handle
    }
}

impl RenderBackend for BevyBackend<'_, '_> {
    fn initialize(&mut self, viewport: &ViewportConfig) -> Result<(), BackendError> {
        if self.render_device.is_none() {
            return Err(BackendError::new(
                "initialize",
                "no render device (GPU adapter) is available",
            ));
        }
        self.globe_assets.initialized = true;
        tracing::info!(
            "Initialized globe backend for a {}x{} viewport",
            viewport.width,
            viewport.height
        );
        Ok(())
    }

    fn register(&mut self, node: SceneNode<'_>) -> Result<(), BackendError> {
        if !self.globe_assets.initialized {
            return Err(BackendError::new("register", "backend not initialized"));
        }

        match node {
            SceneNode::Camera(camera) => {
                let projection = camera.projection;
                self.commands.spawn((
                    Camera3d::default(),
                    Camera {
                        clear_color: bevy::camera::ClearColorConfig::Custom(Color::BLACK),
                        ..default()
                    },
                    Projection::Perspective(PerspectiveProjection {
                        fov: projection.fov_radians(),
                        aspect_ratio: projection.aspect_ratio,
                        near: projection.near,
                        far: projection.far,
                        ..default()
                    }),
                    Transform::from_translation(camera.position).with_rotation(camera.rotation()),
                    GlobeNode::Camera,
                ));
            }
            SceneNode::Light(light) => {
                self.commands.spawn((
                    DirectionalLight {
                        color: srgb(light.color),
                        illuminance: light.intensity * LUX_PER_INTENSITY,
                        shadows_enabled: false,
                        ..default()
                    },
                    Transform::from_translation(light.position).with_rotation(light.rotation()),
                    GlobeNode::Light,
                ));
            }
            SceneNode::Earth(earth) => {
                let mesh = self.add_mesh(sphere_mesh(earth.radius, earth.segments));
                let texture = self.load_image(&earth.texture);
                let material = self.add_material(earth_material(earth, texture));
                self.commands.spawn((
                    Mesh3d(mesh),
                    MeshMaterial3d(material),
                    Transform::IDENTITY,
                    GlobeNode::Earth,
                ));
            }
            SceneNode::Cloud { index, shell } => {
                // Unscaled earth-sized sphere; the transform scales it up.
                let mesh = self.add_mesh(sphere_mesh(shell.radius, shell.segments));
                let texture = self.load_image(&shell.texture);
                let material = self.add_material(cloud_material(shell, texture));
                self.commands.spawn((
                    Mesh3d(mesh),
                    MeshMaterial3d(material),
                    Transform::from_scale(Vec3::splat(shell.scale))
                        .with_rotation(shell.rotation()),
                    GlobeNode::Cloud(index),
                ));
            }
            SceneNode::Distribution { mesh, material } => {
                let visibility = if mesh.is_empty() {
                    Visibility::Hidden
                } else {
                    Visibility::Inherited
                };
                let mesh = self.add_mesh(distribution_mesh(mesh));
                let material = self.add_material(bar_material(material));
                self.commands.spawn((
                    Mesh3d(mesh),
                    MeshMaterial3d(material),
                    Transform::IDENTITY,
                    visibility,
                    GlobeNode::Distribution,
                ));
            }
        }
        Ok(())
    }

    fn render(&mut self, scene: &SceneGraph) -> Result<(), BackendError> {
        if !self.globe_assets.initialized {
            return Err(BackendError::new("render", "backend was released"));
        }

        for (_, node, mut transform) in &mut self.nodes {
            match *node {
                GlobeNode::Camera => {
                    transform.translation = scene.camera.position;
                    transform.rotation = scene.camera.rotation();
                }
                GlobeNode::Light => {
                    transform.translation = scene.light.position;
                    transform.rotation = scene.light.rotation();
                }
                GlobeNode::Cloud(index) => {
                    if let Some(shell) = scene.clouds.get(index) {
                        transform.rotation = shell.rotation();
                    }
                }
                GlobeNode::Earth | GlobeNode::Distribution => {}
            }
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), BackendError> {
        let mut despawned = 0usize;
        for (entity, _, _) in &self.nodes {
            self.commands.entity(entity).despawn();
            despawned += 1;
        }

        for handle in self.globe_assets.meshes.drain(..) {
            self.meshes.remove(&handle);
        }
        for handle in self.globe_assets.materials.drain(..) {
            self.materials.remove(&handle);
        }
        for handle in self.globe_assets.images.drain(..) {
            self.images.remove(&handle);
        }
        self.globe_assets.initialized = false;

        tracing::info!("Released globe backend ({despawned} entities)");
        Ok(())
    }
}
