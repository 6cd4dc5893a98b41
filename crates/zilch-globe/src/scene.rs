//! Scene graph and its registration with a rendering backend.

use glam::{Mat3, Quat, Vec3};

use crate::config::{CameraConfig, GlobeConfig, ViewportConfig, unpack_rgb};
use crate::error::{BackendError, Error, Result};
use crate::mesh::{BarMaterial, DistributionMesh};
use crate::orbit::orbit_point;

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    pub fov_degrees: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Perspective {
    pub fn new(camera: &CameraConfig, viewport: &ViewportConfig) -> Self {
        Self {
            fov_degrees: camera.fov_degrees,
            aspect_ratio: viewport.aspect_ratio(),
            near: camera.near,
            far: camera.far,
        }
    }

    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }
}

/// Rotation that makes `-Z` face `target` from `position`, with `+Y` up.
fn look_rotation(position: Vec3, target: Vec3) -> Quat {
    let Some(back) = (position - target).try_normalize() else {
        return Quat::IDENTITY;
    };
    let right = Vec3::Y.cross(back).try_normalize().unwrap_or(Vec3::X);
    let up = back.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, back))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraNode {
    pub projection: Perspective,
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraNode {
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Orientation facing [`CameraNode::target`].
    pub fn rotation(&self) -> Quat {
        look_rotation(self.position, self.target)
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }
}

/// Directional light; shines from `position` toward `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightNode {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl LightNode {
    pub fn rotation(&self) -> Quat {
        look_rotation(self.position, self.target)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarthNode {
    pub radius: f32,
    pub segments: u32,
    pub texture: String,
    pub shininess: f32,
}

/// A translucent shell concentric with the earth.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudShell {
    /// Radius of the unscaled sphere (the earth radius).
    pub radius: f32,
    /// Tessellation, shared with the earth sphere.
    pub segments: u32,
    pub scale: f32,
    pub opacity: f32,
    /// Rotation about the Y axis, radians.
    pub rotation_y: f32,
    /// Drift rate, radians per millisecond.
    pub rotation_rate: f64,
    pub texture: String,
}

impl CloudShell {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.rotation_y)
    }

    /// Radius after scaling.
    pub fn effective_radius(&self) -> f32 {
        self.radius * self.scale
    }
}

/// Everything drawn for one globe. Owned by the render loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    pub camera: CameraNode,
    pub light: LightNode,
    pub earth: EarthNode,
    pub clouds: Vec<CloudShell>,
    pub distribution: DistributionMesh,
    pub bar_material: BarMaterial,
}

impl SceneGraph {
    /// Every node in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = SceneNode<'_>> {
        [
            SceneNode::Camera(&self.camera),
            SceneNode::Light(&self.light),
            SceneNode::Earth(&self.earth),
        ]
        .into_iter()
        .chain(
            self.clouds
                .iter()
                .enumerate()
                .map(|(index, shell)| SceneNode::Cloud { index, shell }),
        )
        .chain(std::iter::once(SceneNode::Distribution {
            mesh: &self.distribution,
            material: &self.bar_material,
        }))
    }
}

/// A borrowed view of one scene node, as handed to a backend.
#[derive(Debug, Clone, Copy)]
pub enum SceneNode<'a> {
    Camera(&'a CameraNode),
    Light(&'a LightNode),
    Earth(&'a EarthNode),
    Cloud { index: usize, shell: &'a CloudShell },
    Distribution {
        mesh: &'a DistributionMesh,
        material: &'a BarMaterial,
    },
}

/// A host that can draw a [`SceneGraph`].
///
/// Nodes are registered once, after `initialize`, and afterwards only their
/// transforms change between `render` calls.
pub trait RenderBackend {
    /// Prepare a drawable surface for the viewport.
    fn initialize(&mut self, viewport: &ViewportConfig) -> std::result::Result<(), BackendError>;

    /// Take ownership of drawing `node`.
    fn register(&mut self, node: SceneNode<'_>) -> std::result::Result<(), BackendError>;

    /// Draw the scene in its current state.
    fn render(&mut self, scene: &SceneGraph) -> std::result::Result<(), BackendError>;

    /// Free every resource created for the scene.
    fn release(&mut self) -> std::result::Result<(), BackendError>;
}

/// Builds the scene graph and registers it with a backend.
pub struct SceneComposer;

impl SceneComposer {
    /// Compose the scene for `config` around `distribution`.
    ///
    /// Fails with [`Error::InvalidConfig`] before touching the backend when
    /// `config` does not validate, and with [`Error::BackendUnavailable`] when
    /// the backend cannot be initialized. No node is registered in either case.
    pub fn compose<B: RenderBackend>(
        config: &GlobeConfig,
        distribution: DistributionMesh,
        backend: &mut B,
    ) -> Result<SceneGraph> {
        config.validate()?;
        backend
            .initialize(&config.viewport)
            .map_err(|e| Error::BackendUnavailable { reason: e.message })?;

        let scene = Self::build(config, distribution);
        for node in scene.nodes() {
            backend.register(node)?;
        }

        tracing::info!(
            "Composed globe scene: {} cloud shells, {} bars",
            scene.clouds.len(),
            scene.distribution.primitive_count()
        );

        Ok(scene)
    }

    /// Build the scene graph without touching a backend.
    pub fn build(config: &GlobeConfig, distribution: DistributionMesh) -> SceneGraph {
        let start = orbit_point(
            &config.orbit,
            0.0,
            config.orbit.clamp_height(config.orbit.initial_height),
        );

        let camera = CameraNode {
            projection: Perspective::new(&config.camera, &config.viewport),
            position: start,
            target: Vec3::ZERO,
        };

        let light = LightNode {
            color: unpack_rgb(config.light.color),
            intensity: config.light.intensity,
            position: camera.position,
            target: Vec3::ZERO,
        };

        let earth = EarthNode {
            radius: config.earth.radius,
            segments: config.earth.segments,
            texture: config.earth.texture.clone(),
            shininess: config.earth.shininess,
        };

        let clouds = config
            .clouds
            .iter()
            .map(|shell| CloudShell {
                radius: config.earth.radius,
                segments: config.earth.segments,
                scale: shell.scale,
                opacity: shell.opacity,
                rotation_y: 0.0,
                rotation_rate: shell.rotation_rate,
                texture: shell.texture.clone(),
            })
            .collect();

        SceneGraph {
            camera,
            light,
            earth,
            clouds,
            distribution,
            bar_material: BarMaterial::from(&config.bars),
        }
    }
}
