//! Camera orbit around the globe.
//!
//! The horizontal position is a pure function of elapsed time: the camera
//! circles the Y axis at a fixed radius and angular rate. When pointer easing
//! is enabled, the camera height also moves a fraction of the way toward the
//! pointer's vertical target on every tick, within the configured range.

use glam::Vec3;

use crate::config::OrbitConfig;
use crate::pointer::PointerTarget;
use crate::scene::CameraNode;

/// Camera position on the orbit at `elapsed_ms`, at the given height.
pub fn orbit_point(config: &OrbitConfig, elapsed_ms: f64, height: f32) -> Vec3 {
    point_at_angle(config.radius, elapsed_ms * config.angular_rate, height)
}

#[allow(clippy::cast_possible_truncation)]
fn point_at_angle(radius: f32, angle: f64, height: f32) -> Vec3 {
    let radius = f64::from(radius);
    Vec3::new(
        (radius * angle.cos()) as f32,
        height,
        (radius * angle.sin()) as f32,
    )
}

/// Mutable orbit state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    /// Current orbit angle, radians.
    pub angle: f64,
    /// Camera height; always inside the configured range.
    pub vertical_offset: f32,
    /// Elapsed time of the previous tick.
    pub last_tick_ms: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CameraOrbitController {
    config: OrbitConfig,
    state: OrbitState,
}

impl CameraOrbitController {
    pub fn new(config: OrbitConfig) -> Self {
        let state = OrbitState {
            angle: 0.0,
            vertical_offset: config.clamp_height(config.initial_height),
            last_tick_ms: None,
        };
        Self { config, state }
    }

    pub fn state(&self) -> &OrbitState {
        &self.state
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn pointer_easing(&self) -> bool {
        self.config.pointer_easing
    }

    pub fn set_pointer_easing(&mut self, enabled: bool) {
        self.config.pointer_easing = enabled;
    }

    /// Advance to `elapsed_ms` and move `camera` onto the orbit.
    ///
    /// `pointer` is ignored unless pointer easing is enabled. The first tick
    /// only records its timestamp; later ticks ease the height toward
    /// `pointer.y`. Ticks whose time did not advance leave the height alone.
    pub fn tick(
        &mut self,
        elapsed_ms: f64,
        pointer: Option<PointerTarget>,
        camera: &mut CameraNode,
    ) {
        if elapsed_ms.is_finite() {
            self.state.angle = elapsed_ms * self.config.angular_rate;

            if let (Some(target), Some(last), true) =
                (pointer, self.state.last_tick_ms, self.config.pointer_easing)
            {
                self.ease_toward(target.y, elapsed_ms - last);
            }
            self.state.last_tick_ms = Some(elapsed_ms);
        } else {
            tracing::warn!("Ignoring non-finite orbit timestamp: {elapsed_ms}");
        }

        camera.position = point_at_angle(
            self.config.radius,
            self.state.angle,
            self.state.vertical_offset,
        );
        camera.look_at(Vec3::ZERO);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn ease_toward(&mut self, target_y: f32, delta_ms: f64) {
        if !delta_ms.is_finite() || delta_ms <= 0.0 {
            return;
        }
        let divisor = f64::from(self.config.easing_divisor) * delta_ms;
        let fraction = (1.0 / divisor).min(1.0) as f32;
        let gap = target_y - self.state.vertical_offset;
        self.state.vertical_offset = self
            .config
            .clamp_height(self.state.vertical_offset + gap * fraction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobeConfig;
    use crate::mesh::DistributionMesh;
    use crate::scene::SceneComposer;
    use proptest::prelude::*;

    fn camera() -> CameraNode {
        SceneComposer::build(&GlobeConfig::default(), DistributionMesh::empty()).camera
    }

    fn target(y: f32) -> Option<PointerTarget> {
        Some(PointerTarget { x: 0.0, y })
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn test_orbit_is_deterministic() {
        let config = OrbitConfig::default();
        let mut controller = CameraOrbitController::new(config);
        let mut cam = camera();

        for t in [0.0, 1000.0, 2000.0] {
            controller.tick(t, None, &mut cam);
            let expected = Vec3::new(
                1800.0 * (t / 10_000.0).cos() as f32,
                0.0,
                1800.0 * (t / 10_000.0).sin() as f32,
            );
            assert!((cam.position - expected).length() < 1e-2, "t = {t}");
            assert_eq!(cam.target, Vec3::ZERO);
        }

        // Replaying the same timestamp lands on the same point.
        let mut fresh = CameraOrbitController::new(config);
        let mut other = camera();
        fresh.tick(2000.0, None, &mut other);
        assert!((other.position - cam.position).length() < 1e-3);
    }

    #[test]
    fn test_first_tick_does_not_ease() {
        let mut controller = CameraOrbitController::new(OrbitConfig::default());
        let mut cam = camera();
        controller.tick(0.0, target(400.0), &mut cam);
        assert_eq!(controller.state().vertical_offset, 0.0);
        assert_eq!(controller.state().last_tick_ms, Some(0.0));
    }

    #[test]
    fn test_easing_moves_toward_target() {
        let mut controller = CameraOrbitController::new(OrbitConfig::default());
        let mut cam = camera();
        controller.tick(0.0, target(400.0), &mut cam);
        controller.tick(16.0, target(400.0), &mut cam);

        // step = 400 / (2 * 16)
        let offset = controller.state().vertical_offset;
        assert!((offset - 12.5).abs() < 1e-4);
        assert!((cam.position.y - offset).abs() < 1e-6);
    }

    #[test]
    fn test_zero_elapsed_skips_easing() {
        let mut controller = CameraOrbitController::new(OrbitConfig::default());
        let mut cam = camera();
        controller.tick(100.0, target(400.0), &mut cam);
        controller.tick(100.0, target(400.0), &mut cam);
        assert_eq!(controller.state().vertical_offset, 0.0);

        controller.tick(f64::NAN, target(400.0), &mut cam);
        assert_eq!(controller.state().vertical_offset, 0.0);
        assert_eq!(controller.state().last_tick_ms, Some(100.0));
        assert!(cam.position.is_finite());
    }

    #[test]
    fn test_short_interval_does_not_overshoot() {
        let mut controller = CameraOrbitController::new(OrbitConfig::default());
        let mut cam = camera();
        controller.tick(0.0, target(200.0), &mut cam);
        controller.tick(0.1, target(200.0), &mut cam);
        assert!((controller.state().vertical_offset - 200.0).abs() < 1e-4);
    }

    #[test]
    fn test_inverted_range_does_not_panic() {
        let config = OrbitConfig {
            min_height: 600.0,
            max_height: 500.0,
            ..OrbitConfig::default()
        };
        let mut controller = CameraOrbitController::new(config);
        let mut cam = camera();
        controller.tick(0.0, target(-400.0), &mut cam);
        controller.tick(16.0, target(-400.0), &mut cam);
        assert!(controller.state().vertical_offset <= 500.0);
    }

    #[test]
    fn test_easing_disabled_ignores_pointer() {
        let config = OrbitConfig {
            pointer_easing: false,
            ..OrbitConfig::default()
        };
        let mut controller = CameraOrbitController::new(config);
        let mut cam = camera();
        controller.tick(0.0, target(400.0), &mut cam);
        controller.tick(16.0, target(400.0), &mut cam);
        assert_eq!(controller.state().vertical_offset, 0.0);

        controller.set_pointer_easing(true);
        controller.tick(32.0, target(400.0), &mut cam);
        assert!(controller.state().vertical_offset > 0.0);
    }

    proptest! {
        #[test]
        fn prop_offset_stays_in_range(
            targets in proptest::collection::vec(-5000.0f32..5000.0, 1..40),
            steps in proptest::collection::vec(0.0f64..100.0, 1..40),
        ) {
            let config = OrbitConfig::default();
            let (min, max) = (config.min_height, config.max_height);
            let mut controller = CameraOrbitController::new(config);
            let mut cam = camera();
            let mut t = 0.0;

            for (y, dt) in targets.iter().zip(steps.iter().cycle()) {
                t += dt;
                controller.tick(t, target(*y), &mut cam);
                let offset = controller.state().vertical_offset;
                prop_assert!(offset >= min && offset <= max);
                prop_assert!((cam.position.y - offset).abs() < 1e-6);
            }
        }
    }
}
