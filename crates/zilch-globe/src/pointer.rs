//! Pointer tracking over the globe viewport.
//!
//! The tracker is the only writer of the pointer target and the render loop
//! the only reader. Targets travel through a channel, so the reader sees each
//! published value in order and only at the start of a tick.

use crate::config::{PointerConfig, ViewportConfig};

/// Pointer position normalized around the viewport centre.
///
/// `y` is inverted (up is positive) and scaled by the vertical gain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerTarget {
    pub x: f32,
    pub y: f32,
}

/// Normalize a viewport-relative pointer position.
pub fn normalize(
    offset_x: f32,
    offset_y: f32,
    viewport: &ViewportConfig,
    config: &PointerConfig,
) -> PointerTarget {
    let (center_x, center_y) = viewport.center();
    PointerTarget {
        x: (offset_x - center_x) * config.horizontal_gain,
        y: -(offset_y - center_y) * config.vertical_gain,
    }
}

/// Create a connected tracker/subscriber pair.
pub fn channel(
    viewport: ViewportConfig,
    config: PointerConfig,
) -> (PointerTracker, PointerSubscriber) {
    let (tx, rx) = async_channel::bounded(1);
    (
        PointerTracker {
            viewport,
            config,
            tx,
        },
        PointerSubscriber {
            rx,
            latest: PointerTarget::default(),
        },
    )
}

/// Publishes pointer targets from pointer-move events.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    viewport: ViewportConfig,
    config: PointerConfig,
    tx: async_channel::Sender<PointerTarget>,
}

impl PointerTracker {
    /// Handle a pointer move at viewport-relative pixel coordinates.
    pub fn pointer_moved(&self, offset_x: f32, offset_y: f32) -> PointerTarget {
        let target = normalize(offset_x, offset_y, &self.viewport, &self.config);
        // Replaces any unread target. Fails only once the loop is gone.
        let _ = self.tx.force_send(target);
        target
    }

    pub fn viewport(&self) -> ViewportConfig {
        self.viewport
    }
}

/// Reading end of the pointer handoff.
#[derive(Debug)]
pub struct PointerSubscriber {
    rx: async_channel::Receiver<PointerTarget>,
    latest: PointerTarget,
}

impl PointerSubscriber {
    /// Drain pending targets and return the most recent one.
    ///
    /// Returns the centre target until the first event arrives, and the last
    /// known target when nothing new was published.
    pub fn latest(&mut self) -> PointerTarget {
        while let Ok(target) = self.rx.try_recv() {
            self.latest = target;
        }
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centre_maps_to_zero() {
        let target = normalize(
            500.0,
            300.0,
            &ViewportConfig::default(),
            &PointerConfig::default(),
        );
        assert_eq!(target, PointerTarget { x: 0.0, y: 0.0 });
    }

    #[test]
    fn test_y_is_inverted_and_exaggerated() {
        let viewport = ViewportConfig::default();
        let config = PointerConfig::default();

        let top = normalize(500.0, 0.0, &viewport, &config);
        assert!((top.y - 300.0 * 1.7).abs() < 1e-3);

        let bottom_right = normalize(1000.0, 600.0, &viewport, &config);
        assert!((bottom_right.x - 500.0).abs() < 1e-3);
        assert!((bottom_right.y + 300.0 * 1.7).abs() < 1e-3);
    }

    #[test]
    fn test_subscriber_sees_latest_target() {
        let (tracker, mut subscriber) = channel(ViewportConfig::default(), PointerConfig::default());

        assert_eq!(subscriber.latest(), PointerTarget::default());

        tracker.pointer_moved(500.0, 200.0);
        tracker.pointer_moved(500.0, 100.0);
        let latest = subscriber.latest();
        assert!((latest.y - 200.0 * 1.7).abs() < 1e-3);

        // Nothing new: the previous target persists.
        assert_eq!(subscriber.latest(), latest);
    }

    #[test]
    fn test_undrained_subscriber_holds_one_target() {
        let (tracker, mut subscriber) = channel(ViewportConfig::default(), PointerConfig::default());

        for i in 0..10_000u16 {
            tracker.pointer_moved(f32::from(i % 1000), 300.0);
        }
        assert!(subscriber.rx.len() <= 1);

        let latest = subscriber.latest();
        assert!((latest.x - (999.0 - 500.0)).abs() < 1e-3);
        assert!(subscriber.rx.is_empty());
    }

    #[test]
    fn test_publish_after_subscriber_dropped() {
        let (tracker, subscriber) = channel(ViewportConfig::default(), PointerConfig::default());
        drop(subscriber);
        let target = tracker.pointer_moved(0.0, 0.0);
        assert!(target.x < 0.0);
    }
}
