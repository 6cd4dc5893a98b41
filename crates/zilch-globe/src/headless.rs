//! A recording backend and a manually driven scheduler.
//!
//! Used by the tests and by the viewer's headless mode, where frames are
//! simulated at a fixed interval instead of being driven by a display.

use crate::config::ViewportConfig;
use crate::error::{BackendError, Result};
use crate::render_loop::{FrameOutcome, FrameScheduler, RenderLoop};
use crate::scene::{CameraNode, LightNode, RenderBackend, SceneGraph, SceneNode};

/// Scheduler that only counts requests; the driver decides when frames run.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    pending: usize,
    requested: u64,
    cancelled: bool,
}

impl ManualScheduler {
    /// Outstanding frame requests.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Requests made over the scheduler's lifetime.
    pub fn total_requests(&self) -> u64 {
        self.requested
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Consume one pending request, if any.
    pub fn take_request(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        true
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        if self.cancelled {
            return;
        }
        self.pending += 1;
        self.requested += 1;
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        self.pending = 0;
    }
}

/// What a [`HeadlessBackend`] was asked to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisteredNode {
    Camera,
    Light,
    Earth,
    Cloud(usize),
    Distribution { primitives: usize },
}

/// Backend that draws nothing and records every call.
#[derive(Debug, Default, Clone)]
pub struct HeadlessBackend {
    viewport: Option<ViewportConfig>,
    registered: Vec<RegisteredNode>,
    frames: usize,
    last_camera: Option<CameraNode>,
    last_light: Option<LightNode>,
    last_cloud_rotations: Vec<f32>,
    releases: usize,
    init_failure: Option<String>,
    render_limit: Option<usize>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose initialization fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            init_failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Make every render after the first `frames` fail.
    #[must_use]
    pub fn fail_render_after(mut self, frames: usize) -> Self {
        self.render_limit = Some(frames);
        self
    }

    pub fn viewport(&self) -> Option<ViewportConfig> {
        self.viewport
    }

    pub fn registered(&self) -> &[RegisteredNode] {
        &self.registered
    }

    pub fn frames_rendered(&self) -> usize {
        self.frames
    }

    pub fn last_camera(&self) -> Option<CameraNode> {
        self.last_camera
    }

    pub fn last_light(&self) -> Option<LightNode> {
        self.last_light
    }

    /// Cloud rotations (radians about Y) at the last frame.
    pub fn last_cloud_rotations(&self) -> &[f32] {
        &self.last_cloud_rotations
    }

    pub fn is_released(&self) -> bool {
        self.releases > 0
    }

    pub fn release_count(&self) -> usize {
        self.releases
    }
}

impl RenderBackend for HeadlessBackend {
    fn initialize(&mut self, viewport: &ViewportConfig) -> std::result::Result<(), BackendError> {
        if let Some(reason) = &self.init_failure {
            return Err(BackendError::new("initialize", reason.clone()));
        }
        self.viewport = Some(*viewport);
        Ok(())
    }

    fn register(&mut self, node: SceneNode<'_>) -> std::result::Result<(), BackendError> {
        if self.viewport.is_none() {
            return Err(BackendError::new("register", "backend not initialized"));
        }
        self.registered.push(match node {
            SceneNode::Camera(_) => RegisteredNode::Camera,
            SceneNode::Light(_) => RegisteredNode::Light,
            SceneNode::Earth(_) => RegisteredNode::Earth,
            SceneNode::Cloud { index, .. } => RegisteredNode::Cloud(index),
            SceneNode::Distribution { mesh, .. } => RegisteredNode::Distribution {
                primitives: mesh.primitive_count(),
            },
        });
        Ok(())
    }

    fn render(&mut self, scene: &SceneGraph) -> std::result::Result<(), BackendError> {
        if self.render_limit.is_some_and(|limit| self.frames >= limit) {
            return Err(BackendError::new("render", "simulated device loss"));
        }
        self.frames += 1;
        self.last_camera = Some(scene.camera);
        self.last_light = Some(scene.light);
        self.last_cloud_rotations = scene.clouds.iter().map(|c| c.rotation_y).collect();
        Ok(())
    }

    fn release(&mut self) -> std::result::Result<(), BackendError> {
        self.releases += 1;
        self.registered.clear();
        Ok(())
    }
}

/// Summary of a simulated run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessReport {
    pub frames: u64,
    pub elapsed_ms: f64,
    pub final_camera: CameraNode,
}

/// Run `render_loop` for up to `frames` frames spaced `interval_ms` apart,
/// then stop it.
///
/// A frame only runs while the scheduler has a pending request, so the run
/// ends early if the loop stops scheduling itself.
pub fn simulate<B: RenderBackend>(
    render_loop: &mut RenderLoop<ManualScheduler>,
    backend: &mut B,
    frames: u32,
    interval_ms: f64,
) -> Result<HeadlessReport> {
    render_loop.start();
    for i in 0..frames {
        if !render_loop.scheduler_mut().take_request() {
            break;
        }
        if render_loop.frame(f64::from(i) * interval_ms, backend)? != FrameOutcome::Rendered {
            break;
        }
    }
    render_loop.stop(backend)?;

    let report = HeadlessReport {
        frames: render_loop.frame_count(),
        elapsed_ms: render_loop.elapsed_ms(),
        final_camera: render_loop.scene().camera,
    };
    tracing::info!(
        "Simulated {} frames over {:.0} ms",
        report.frames,
        report.elapsed_ms
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobeConfig;
    use crate::mesh::DistributionMesh;
    use crate::scene::SceneComposer;

    #[test]
    fn test_cancelled_scheduler_ignores_requests() {
        let mut scheduler = ManualScheduler::default();
        scheduler.request_frame();
        scheduler.cancel();
        scheduler.request_frame();
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.total_requests(), 1);
        assert!(!scheduler.take_request());
    }

    #[test]
    fn test_register_requires_initialize() {
        let mut backend = HeadlessBackend::new();
        let scene = SceneComposer::build(&GlobeConfig::default(), DistributionMesh::empty());
        let err = backend.register(SceneNode::Earth(&scene.earth)).unwrap_err();
        assert_eq!(err.operation, "register");
    }

    #[test]
    fn test_simulate_runs_requested_frames() {
        let config = GlobeConfig::default();
        let mut backend = HeadlessBackend::new();
        let scene = SceneComposer::compose(&config, DistributionMesh::empty(), &mut backend).unwrap();
        let mut render_loop = RenderLoop::from_config(&config, scene, ManualScheduler::default());

        let report = simulate(&mut render_loop, &mut backend, 10, 100.0).unwrap();

        assert_eq!(report.frames, 10);
        assert!((report.elapsed_ms - 900.0).abs() < 1e-9);
        assert_eq!(backend.frames_rendered(), 10);
        assert!(backend.is_released());
        assert_eq!(backend.last_cloud_rotations().len(), 1);
    }
}
