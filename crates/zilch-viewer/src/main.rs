//! Rotating density globe viewer using Bevy.
//!
//! Renders an earth sphere with a translucent cloud shell and one extruded
//! bar per location in the density payload. The camera circles the globe and
//! tilts toward the pointer.

mod backend;
mod globe;
mod headless;
mod input;
mod launch_params;
mod loader;
mod mesh;
mod ui;

use std::process::ExitCode;

use bevy::prelude::*;
use globe::{GlobePlugin, GlobeSettings};
use input::GlobeInputPlugin;
use loader::PayloadLoaderPlugin;
use ui::DebugUiPlugin;

/// Plugin for the main application.
pub struct AppPlugin;

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((GlobePlugin, PayloadLoaderPlugin, GlobeInputPlugin, DebugUiPlugin));
    }
}

fn main() -> ExitCode {
    // Initialize tracing for native platforms.
    #[cfg(not(target_family = "wasm"))]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Initialize tracing for WASM (logs to browser console).
    #[cfg(target_family = "wasm")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    let params = launch_params::parse();
    let config = match params.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(frames) = params.headless_frames {
        return match headless::run(&params, &config, frames) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("Headless run failed: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let mut app = App::new();

    #[allow(unused_mut)]
    let mut window = Window {
        title: "zilch".to_string(),
        resolution: (config.viewport.width, config.viewport.height).into(),
        ..Default::default()
    };

    // WASM: Fit canvas to parent element and prevent browser event handling.
    #[cfg(target_family = "wasm")]
    {
        window.fit_canvas_to_parent = true;
        window.prevent_default_event_handling = true;
    }

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(window),
        ..Default::default()
    }))
    .insert_resource(params)
    .insert_resource(GlobeSettings(config))
    .add_plugins(AppPlugin);

    match app.run() {
        AppExit::Success => ExitCode::SUCCESS,
        AppExit::Error(_) => ExitCode::FAILURE,
    }
}
