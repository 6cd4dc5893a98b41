//! Key actions and pointer input for the globe.
//!
//! Keyboard actions go through `leafwing-input-manager`. Cursor moves are
//! rescaled from window space into the configured viewport and published to
//! the render loop's pointer handoff.

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use leafwing_input_manager::prelude::*;
use zilch_globe::PointerTracker;
use zilch_globe::config::ViewportConfig;

use crate::backend::BevyBackend;
use crate::globe::GlobeLoop;

/// Actions available while the globe is running.
#[derive(Actionlike, PartialEq, Eq, Hash, Clone, Copy, Debug, Reflect)]
pub enum GlobeAction {
    /// Stop the render loop and quit (Escape).
    Stop,
    /// Toggle the debug overlay (Q).
    ToggleUi,
    /// Toggle pointer-driven camera tilt (P).
    TogglePointerEasing,
}

/// Create the default input map for globe actions.
pub fn default_globe_input_map() -> InputMap<GlobeAction> {
    InputMap::default()
        .with(GlobeAction::Stop, KeyCode::Escape)
        .with(GlobeAction::ToggleUi, KeyCode::KeyQ)
        .with(GlobeAction::TogglePointerEasing, KeyCode::KeyP)
}

/// Writing end of the pointer handoff.
#[derive(Resource)]
pub struct PointerInput(pub PointerTracker);

/// Plugin that registers globe actions and pointer tracking.
pub struct GlobeInputPlugin;

impl Plugin for GlobeInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(InputManagerPlugin::<GlobeAction>::default())
            .add_systems(Startup, spawn_input)
            .add_systems(
                Update,
                (
                    track_pointer.run_if(resource_exists::<PointerInput>),
                    handle_globe_actions.run_if(resource_exists::<GlobeLoop>),
                ),
            );
    }
}

fn spawn_input(mut commands: Commands) {
    commands.spawn((
        Name::new("Globe input"),
        default_globe_input_map(),
        ActionState::<GlobeAction>::default(),
    ));
}

/// Map a window-space cursor position into viewport pixels.
///
/// The window may be resized away from the configured viewport; positions are
/// scaled so the pointer target keeps the viewport's range.
#[allow(clippy::cast_precision_loss)]
pub fn viewport_offset(position: Vec2, window_size: Vec2, viewport: ViewportConfig) -> Vec2 {
    let viewport_size = Vec2::new(viewport.width as f32, viewport.height as f32);
    if window_size.x <= 0.0 || window_size.y <= 0.0 {
        return position;
    }
    position * viewport_size / window_size
}

/// Publish cursor moves to the render loop.
#[allow(clippy::needless_pass_by_value)]
fn track_pointer(
    mut cursor_moved: MessageReader<CursorMoved>,
    pointer: Res<PointerInput>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let Ok(window) = windows.single() else {
        cursor_moved.clear();
        return;
    };

    let viewport = pointer.0.viewport();
    for event in cursor_moved.read() {
        let offset = viewport_offset(event.position, window.size(), viewport);
        pointer.0.pointer_moved(offset.x, offset.y);
    }
}

/// Stop the loop or toggle easing on key press.
#[allow(clippy::needless_pass_by_value)]
fn handle_globe_actions(
    action_query: Query<&ActionState<GlobeAction>>,
    mut globe: ResMut<GlobeLoop>,
    mut backend: BevyBackend,
    mut exit: MessageWriter<AppExit>,
) {
    let Ok(action_state) = action_query.single() else {
        return;
    };

    if action_state.just_pressed(&GlobeAction::TogglePointerEasing) {
        let orbit = globe.orbit_mut();
        let enabled = !orbit.pointer_easing();
        orbit.set_pointer_easing(enabled);
        tracing::info!("Pointer easing {}", if enabled { "enabled" } else { "disabled" });
    }

    if action_state.just_pressed(&GlobeAction::Stop) {
        if let Err(e) = globe.stop(&mut backend) {
            tracing::error!("Failed to stop the globe cleanly: {e}");
            exit.write(AppExit::error());
            return;
        }
        exit.write(AppExit::Success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_offset_matches_unscaled_window() {
        let viewport = ViewportConfig::default();
        let offset = viewport_offset(Vec2::new(250.0, 150.0), Vec2::new(1000.0, 600.0), viewport);
        assert_eq!(offset, Vec2::new(250.0, 150.0));
    }

    #[test]
    fn test_viewport_offset_scales_resized_window() {
        let viewport = ViewportConfig::default();
        let offset = viewport_offset(Vec2::new(1000.0, 600.0), Vec2::new(2000.0, 1200.0), viewport);
        assert_eq!(offset, Vec2::new(500.0, 300.0));
    }

    #[test]
    fn test_viewport_offset_ignores_degenerate_window() {
        let offset = viewport_offset(Vec2::new(3.0, 4.0), Vec2::ZERO, ViewportConfig::default());
        assert_eq!(offset, Vec2::new(3.0, 4.0));
    }
}
