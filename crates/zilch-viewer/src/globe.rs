//! Drives the globe render loop from Bevy's update schedule.
//!
//! Bevy's own frame pacing stands in for the display refresh: each update runs
//! at most one globe frame, and only if the loop asked for one.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;
use web_time::Instant;
use zilch_globe::{FrameScheduler, GlobeConfig, RenderLoop};

use crate::backend::{BevyBackend, GlobeAssets};

/// Plugin that owns the globe loop lifecycle.
pub struct GlobePlugin;

impl Plugin for GlobePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GlobeAssets>()
            .init_resource::<GlobeClock>()
            .add_systems(Update, drive_globe.run_if(resource_exists::<GlobeLoop>));
    }
}

/// Effective globe configuration for this run.
#[derive(Resource, Debug, Clone, Deref)]
pub struct GlobeSettings(pub GlobeConfig);

/// One-shot frame request flag.
#[derive(Debug, Default)]
pub struct BevyFrameScheduler {
    requested: bool,
    cancelled: bool,
}

impl BevyFrameScheduler {
    /// Consume the outstanding request, if any.
    pub fn take_request(&mut self) -> bool {
        std::mem::take(&mut self.requested)
    }
}

impl FrameScheduler for BevyFrameScheduler {
    fn request_frame(&mut self) {
        if !self.cancelled {
            self.requested = true;
        }
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        self.requested = false;
    }
}

/// The running globe.
#[derive(Resource, Deref, DerefMut)]
pub struct GlobeLoop(pub RenderLoop<BevyFrameScheduler>);

/// Host clock for frame timestamps.
#[derive(Resource)]
pub struct GlobeClock {
    start: Instant,
}

impl Default for GlobeClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl GlobeClock {
    /// Milliseconds since the clock was created.
    pub fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Run one globe frame if one was requested.
#[allow(clippy::needless_pass_by_value)]
fn drive_globe(
    mut globe: ResMut<GlobeLoop>,
    mut backend: BevyBackend,
    clock: Res<GlobeClock>,
    mut exit: MessageWriter<AppExit>,
) {
    if !globe.scheduler_mut().take_request() {
        return;
    }

    if let Err(e) = globe.frame(clock.now_ms(), &mut backend) {
        tracing::error!("Globe rendering failed: {e}");
        exit.write(AppExit::error());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_grants_one_frame_per_request() {
        let mut scheduler = BevyFrameScheduler::default();
        assert!(!scheduler.take_request());

        scheduler.request_frame();
        scheduler.request_frame();
        assert!(scheduler.take_request());
        assert!(!scheduler.take_request());
    }

    #[test]
    fn test_cancel_drops_pending_request() {
        let mut scheduler = BevyFrameScheduler::default();
        scheduler.request_frame();
        scheduler.cancel();
        assert!(!scheduler.take_request());

        scheduler.request_frame();
        assert!(!scheduler.take_request());
    }
}
