//! Backend-agnostic engine for a rotating density globe.
//!
//! This crate turns a payload of geographic counts into a scene: an earth
//! sphere, translucent cloud shells, a light that follows the camera, and one
//! extruded bar per location merged into a single mesh. A [`RenderLoop`]
//! animates the scene and hands it to a [`RenderBackend`] each frame.
//!
//! # Design principles
//!
//! - **No renderer dependency**: drawing and frame pacing are traits
//! - **Owned state**: each [`RenderLoop`] owns its scene, so several globes can coexist
//! - **Deterministic**: the orbit is a function of elapsed time alone
//!
//! # Example
//!
//! ```ignore
//! use zilch_globe::{
//!     DistributionMeshBuilder, GlobeConfig, HeadlessBackend, ManualScheduler, RenderLoop,
//!     SceneComposer, parse_payload,
//! };
//!
//! let config = GlobeConfig::default();
//! let payload = parse_payload(&text)?;
//! let mesh = DistributionMeshBuilder::new(config.bars, config.earth.radius).build(&payload.records);
//!
//! let mut backend = HeadlessBackend::new();
//! let scene = SceneComposer::compose(&config, mesh, &mut backend)?;
//! let mut render_loop = RenderLoop::from_config(&config, scene, ManualScheduler::default());
//! render_loop.start();
//! render_loop.frame(0.0, &mut backend)?;
//! ```

pub mod config;
pub mod density;
mod error;
pub mod headless;
pub mod mesh;
pub mod orbit;
pub mod pointer;
pub mod projection;
pub mod render_loop;
pub mod scene;

pub use config::GlobeConfig;
pub use density::{DensityPayload, DensityRecord, parse_payload};
pub use error::{BackendError, Error, Result};
pub use headless::{HeadlessBackend, ManualScheduler};
pub use mesh::{BarMaterial, BarPrimitive, DistributionMesh, DistributionMeshBuilder};
pub use orbit::{CameraOrbitController, OrbitState};
pub use pointer::{PointerSubscriber, PointerTarget, PointerTracker};
pub use projection::project;
pub use render_loop::{FrameOutcome, FrameScheduler, RenderLoop};
pub use scene::{
    CameraNode, CloudShell, EarthNode, LightNode, RenderBackend, SceneComposer, SceneGraph,
    SceneNode,
};
