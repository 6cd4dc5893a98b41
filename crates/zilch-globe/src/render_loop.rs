//! The continuously rescheduled frame callback.
//!
//! A [`RenderLoop`] owns the scene and the orbit controller. The host calls
//! [`RenderLoop::frame`] whenever the scheduler fires; each frame advances the
//! animation, submits the scene and asks the scheduler for the next frame.

use glam::Vec3;

use crate::config::{GlobeConfig, LightConfig};
use crate::error::Result;
use crate::orbit::CameraOrbitController;
use crate::pointer::{PointerSubscriber, PointerTarget};
use crate::scene::{RenderBackend, SceneGraph};

/// Host capability that calls back into the loop once per display frame.
pub trait FrameScheduler {
    /// Ask for one more frame callback.
    fn request_frame(&mut self);

    /// Drop any outstanding frame request.
    fn cancel(&mut self);
}

/// Result of a single [`RenderLoop::frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The scene was advanced and submitted.
    Rendered,
    /// The loop has not been started yet; nothing happened.
    Idle,
    /// The loop was stopped; nothing happened.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Idle,
    Running,
    Stopped,
}

pub struct RenderLoop<S> {
    scene: SceneGraph,
    orbit: CameraOrbitController,
    scheduler: S,
    pointer: Option<PointerSubscriber>,
    light_vertical_offset: f32,
    state: LoopState,
    first_frame_ms: Option<f64>,
    elapsed_ms: f64,
    frames: u64,
    last_pointer: Option<PointerTarget>,
}

impl<S: FrameScheduler> RenderLoop<S> {
    pub fn new(scene: SceneGraph, orbit: CameraOrbitController, scheduler: S) -> Self {
        Self {
            scene,
            orbit,
            scheduler,
            pointer: None,
            light_vertical_offset: LightConfig::default().vertical_offset,
            state: LoopState::Idle,
            first_frame_ms: None,
            elapsed_ms: 0.0,
            frames: 0,
            last_pointer: None,
        }
    }

    /// Loop for `config`, with the orbit and light offset it names.
    pub fn from_config(config: &GlobeConfig, scene: SceneGraph, scheduler: S) -> Self {
        Self::new(scene, CameraOrbitController::new(config.orbit), scheduler)
            .with_light_offset(config.light.vertical_offset)
    }

    /// Attach the reading end of a pointer handoff.
    #[must_use]
    pub fn with_pointer(mut self, pointer: PointerSubscriber) -> Self {
        self.pointer = Some(pointer);
        self
    }

    /// Offset of the light below (negative) or above the camera.
    #[must_use]
    pub fn with_light_offset(mut self, vertical_offset: f32) -> Self {
        self.light_vertical_offset = vertical_offset;
        self
    }

    /// Request the first frame. Has no effect once stopped.
    pub fn start(&mut self) {
        match self.state {
            LoopState::Idle => {
                self.state = LoopState::Running;
                self.scheduler.request_frame();
                tracing::debug!("Render loop started");
            }
            LoopState::Running => {}
            LoopState::Stopped => tracing::warn!("Ignoring start of a stopped render loop"),
        }
    }

    /// Run one frame at `timestamp_ms` (host clock, milliseconds).
    ///
    /// Elapsed time is measured from the first rendered frame. A render
    /// failure stops the loop and releases the backend before the error is
    /// returned.
    pub fn frame<B: RenderBackend>(
        &mut self,
        timestamp_ms: f64,
        backend: &mut B,
    ) -> Result<FrameOutcome> {
        match self.state {
            LoopState::Idle => return Ok(FrameOutcome::Idle),
            LoopState::Stopped => return Ok(FrameOutcome::Stopped),
            LoopState::Running => {}
        }

        let first = *self.first_frame_ms.get_or_insert(timestamp_ms);
        let elapsed = timestamp_ms - first;

        let pointer = self.pointer.as_mut().map(PointerSubscriber::latest);
        self.last_pointer = pointer;
        self.orbit.tick(elapsed, pointer, &mut self.scene.camera);
        if elapsed.is_finite() {
            self.elapsed_ms = elapsed;
        }

        self.advance_clouds();
        self.follow_camera_with_light();

        if let Err(e) = backend.render(&self.scene) {
            tracing::error!("Render failed, stopping loop: {}", e.message);
            if let Err(release) = self.stop(backend) {
                tracing::warn!("Release after render failure also failed: {release}");
            }
            return Err(e.into());
        }

        self.frames += 1;
        self.scheduler.request_frame();
        Ok(FrameOutcome::Rendered)
    }

    /// Cancel scheduling and release backend resources.
    ///
    /// Later [`RenderLoop::frame`] calls return [`FrameOutcome::Stopped`].
    /// Stopping twice is a no-op.
    pub fn stop<B: RenderBackend>(&mut self, backend: &mut B) -> Result<()> {
        if self.state == LoopState::Stopped {
            return Ok(());
        }
        self.state = LoopState::Stopped;
        self.scheduler.cancel();
        backend.release()?;
        tracing::info!("Render loop stopped after {} frames", self.frames);
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn advance_clouds(&mut self) {
        let elapsed = self.elapsed_ms;
        for shell in &mut self.scene.clouds {
            shell.rotation_y = -(elapsed * shell.rotation_rate) as f32;
        }
    }

    fn follow_camera_with_light(&mut self) {
        let offset = Vec3::new(0.0, self.light_vertical_offset, 0.0);
        let light = &mut self.scene.light;
        light.position = self.scene.camera.position + offset;
        light.target = Vec3::ZERO;
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn orbit(&self) -> &CameraOrbitController {
        &self.orbit
    }

    pub fn orbit_mut(&mut self) -> &mut CameraOrbitController {
        &mut self.orbit
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.state == LoopState::Stopped
    }

    /// Milliseconds since the first rendered frame.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Number of frames submitted to the backend.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Pointer target used by the most recent frame.
    pub fn last_pointer(&self) -> Option<PointerTarget> {
        self.last_pointer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::headless::{HeadlessBackend, ManualScheduler};
    use crate::mesh::DistributionMesh;
    use crate::pointer;
    use crate::scene::SceneComposer;

    fn globe(backend: &mut HeadlessBackend) -> RenderLoop<ManualScheduler> {
        let config = GlobeConfig::default();
        let scene = SceneComposer::compose(&config, DistributionMesh::empty(), backend).unwrap();
        RenderLoop::from_config(&config, scene, ManualScheduler::default())
    }

    #[test]
    fn test_start_requests_first_frame() {
        let mut backend = HeadlessBackend::new();
        let mut render_loop = globe(&mut backend);

        assert_eq!(
            render_loop.frame(0.0, &mut backend).unwrap(),
            FrameOutcome::Idle
        );
        assert_eq!(render_loop.scheduler().pending(), 0);

        render_loop.start();
        render_loop.start();
        assert_eq!(render_loop.scheduler().pending(), 1);
    }

    #[test]
    fn test_each_frame_reschedules() {
        let mut backend = HeadlessBackend::new();
        let mut render_loop = globe(&mut backend);
        render_loop.start();

        for i in 0..3u32 {
            assert!(render_loop.scheduler_mut().take_request());
            let outcome = render_loop.frame(f64::from(i) * 16.0, &mut backend).unwrap();
            assert_eq!(outcome, FrameOutcome::Rendered);
        }

        assert_eq!(render_loop.scheduler().pending(), 1);
        assert_eq!(render_loop.frame_count(), 3);
        assert_eq!(backend.frames_rendered(), 3);
    }

    #[test]
    fn test_light_follows_camera() {
        let mut backend = HeadlessBackend::new();
        let mut render_loop = globe(&mut backend);
        render_loop.start();
        render_loop.frame(1000.0, &mut backend).unwrap();
        render_loop.frame(3500.0, &mut backend).unwrap();

        let scene = render_loop.scene();
        let expected = scene.camera.position + Vec3::new(0.0, -300.0, 0.0);
        assert!((scene.light.position - expected).length() < 1e-4);
        assert_eq!(scene.light.target, Vec3::ZERO);
        assert_eq!(backend.last_light().map(|l| l.position), Some(scene.light.position));
    }

    #[test]
    fn test_clouds_rotate_with_elapsed_time() {
        let mut backend = HeadlessBackend::new();
        let mut render_loop = globe(&mut backend);
        render_loop.start();
        render_loop.frame(5000.0, &mut backend).unwrap();
        assert_eq!(render_loop.scene().clouds[0].rotation_y, 0.0);

        render_loop.frame(45_000.0, &mut backend).unwrap();
        assert!((render_loop.elapsed_ms() - 40_000.0).abs() < 1e-9);
        assert!((render_loop.scene().clouds[0].rotation_y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_is_read_each_frame() {
        let config = GlobeConfig::default();
        let (tracker, subscriber) = pointer::channel(config.viewport, config.pointer);
        let mut backend = HeadlessBackend::new();
        let mut render_loop = globe(&mut backend).with_pointer(subscriber);
        render_loop.start();

        render_loop.frame(0.0, &mut backend).unwrap();
        tracker.pointer_moved(500.0, 0.0);
        render_loop.frame(16.0, &mut backend).unwrap();

        let target = render_loop.last_pointer().unwrap();
        assert!((target.y - 510.0).abs() < 1e-3);
        assert!(render_loop.orbit().state().vertical_offset > 0.0);
        assert!(render_loop.scene().camera.position.y > 0.0);
    }

    #[test]
    fn test_stop_cancels_and_releases() {
        let mut backend = HeadlessBackend::new();
        let mut render_loop = globe(&mut backend);
        render_loop.start();
        render_loop.frame(0.0, &mut backend).unwrap();

        render_loop.stop(&mut backend).unwrap();
        assert!(render_loop.is_stopped());
        assert!(render_loop.scheduler().is_cancelled());
        assert_eq!(render_loop.scheduler().pending(), 0);
        assert!(backend.is_released());

        assert_eq!(
            render_loop.frame(16.0, &mut backend).unwrap(),
            FrameOutcome::Stopped
        );
        assert_eq!(backend.frames_rendered(), 1);

        render_loop.start();
        assert_eq!(render_loop.scheduler().pending(), 0);
        render_loop.stop(&mut backend).unwrap();
        assert_eq!(backend.release_count(), 1);
    }

    #[test]
    fn test_render_failure_stops_loop() {
        let mut backend = HeadlessBackend::new().fail_render_after(1);
        let mut render_loop = globe(&mut backend);
        render_loop.start();

        assert!(render_loop.frame(0.0, &mut backend).is_ok());
        let err = render_loop.frame(16.0, &mut backend).unwrap_err();
        assert!(matches!(err, Error::Backend { operation: "render", .. }));
        assert!(render_loop.is_stopped());
        assert!(backend.is_released());
    }
}
