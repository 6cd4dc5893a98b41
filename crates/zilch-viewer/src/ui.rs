//! Debug UI for displaying frame rate and globe state.

use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin, EguiPrimaryContextPass, egui};
use leafwing_input_manager::prelude::ActionState;

use crate::globe::GlobeLoop;
use crate::input::GlobeAction;
use crate::loader::PayloadStats;

/// Plugin for the debug overlay.
pub struct DebugUiPlugin;

impl Plugin for DebugUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin::default())
            .add_plugins(FrameTimeDiagnosticsPlugin::default())
            .init_resource::<UiVisible>()
            .add_systems(Update, toggle_ui_visible)
            .add_systems(EguiPrimaryContextPass, debug_ui_system);
    }
}

/// Whether the overlay is shown.
#[derive(Resource)]
pub struct UiVisible(pub bool);

impl Default for UiVisible {
    fn default() -> Self {
        Self(true)
    }
}

/// Toggle overlay visibility with Q.
fn toggle_ui_visible(
    action_query: Query<&ActionState<GlobeAction>>,
    mut visible: ResMut<UiVisible>,
) {
    let Ok(action_state) = action_query.single() else {
        return;
    };

    if action_state.just_pressed(&GlobeAction::ToggleUi) {
        visible.0 = !visible.0;
    }
}

/// Render the debug overlay.
#[allow(clippy::needless_pass_by_value)]
fn debug_ui_system(
    mut contexts: EguiContexts,
    visible: Res<UiVisible>,
    diagnostics: Res<DiagnosticsStore>,
    globe: Option<Res<GlobeLoop>>,
    stats: Option<Res<PayloadStats>>,
) -> Result {
    if !visible.0 {
        return Ok(());
    }
    let ctx = contexts.ctx_mut()?;

    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(bevy::diagnostic::Diagnostic::smoothed)
        .unwrap_or(0.0);

    egui::Window::new("Globe")
        .default_pos([10.0, 10.0])
        .show(ctx, |ui| {
            ui.label(format!("FPS: {fps:.0}"));

            match stats.as_deref() {
                Some(stats) => {
                    ui.label(format!(
                        "Bars: {} ({} skipped)",
                        stats.records, stats.skipped
                    ));
                    ui.label(format!("Total count: {}", stats.total_count));
                }
                None => {
                    ui.label("Loading payload...");
                }
            }

            if let Some(globe) = globe.as_deref() {
                let camera = globe.scene().camera;
                let orbit = globe.orbit();
                ui.separator();
                ui.label(format!(
                    "Camera: ({:.0}, {:.0}, {:.0})",
                    camera.position.x, camera.position.y, camera.position.z
                ));
                ui.label(format!(
                    "Vertical offset: {:.1}",
                    orbit.state().vertical_offset
                ));
                if let Some(target) = globe.last_pointer() {
                    ui.label(format!("Pointer: ({:.0}, {:.0})", target.x, target.y));
                }
                ui.label(format!(
                    "Pointer easing: {}",
                    if orbit.pointer_easing() { "on" } else { "off" }
                ));
                ui.label(format!(
                    "Frames: {} ({:.1} s)",
                    globe.frame_count(),
                    globe.elapsed_ms() / 1000.0
                ));
                if globe.is_stopped() {
                    ui.label("Stopped");
                }
            }

            ui.separator();
            ui.label("Controls:");
            ui.label("  Mouse - Tilt camera");
            ui.label("  P - Toggle pointer easing");
            ui.label("  Q - Toggle this panel");
            ui.label("  Esc - Stop");
        });

    Ok(())
}
