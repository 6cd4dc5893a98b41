//! Launch parameter parsing for the viewer.
//!
//! On native, parameters are parsed from command-line arguments using clap.
//! On WASM, defaults are used (CLI argument parsing is not available).

use std::path::PathBuf;

use bevy::prelude::*;
use zilch_globe::GlobeConfig;

/// Frame spacing used by the headless simulation, in milliseconds.
pub const HEADLESS_FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// Launch parameters for the viewer.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct LaunchParams {
    /// Density payload (JSON or JSONP) to visualize.
    pub payload: Option<PathBuf>,
    /// Globe config file (JSON).
    pub config: Option<PathBuf>,
    /// Viewport width override.
    pub width: Option<u32>,
    /// Viewport height override.
    pub height: Option<u32>,
    /// Vertical field of view override, in degrees.
    pub fov: Option<f32>,
    /// Orbit radius override.
    pub orbit_radius: Option<f32>,
    /// Disable pointer-driven camera tilt.
    pub no_pointer_easing: bool,
    /// Simulate this many frames without opening a window, then exit.
    pub headless_frames: Option<u32>,
}

impl LaunchParams {
    /// Load the config file (if any), apply overrides and validate.
    pub fn resolve_config(&self) -> zilch_globe::Result<GlobeConfig> {
        let base = match &self.config {
            Some(path) => GlobeConfig::load(path)?,
            None => GlobeConfig::default(),
        };
        let config = self.apply_overrides(base);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, mut config: GlobeConfig) -> GlobeConfig {
        if let Some(width) = self.width {
            config.viewport.width = width;
        }
        if let Some(height) = self.height {
            config.viewport.height = height;
        }
        if let Some(fov) = self.fov {
            config.camera.fov_degrees = fov;
        }
        if let Some(radius) = self.orbit_radius {
            config.orbit.radius = radius;
        }
        if self.no_pointer_easing {
            config.orbit.pointer_easing = false;
        }
        config
    }
}

#[cfg(not(target_family = "wasm"))]
mod native {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    #[command(about = "Rotating 3D globe with a density overlay")]
    pub(super) struct CliArgs {
        /// Density payload file (JSON array or JSONP).
        #[arg(long)]
        payload: Option<PathBuf>,

        /// Globe config file (JSON); missing fields keep their defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Viewport width in logical pixels.
        #[arg(long)]
        width: Option<u32>,

        /// Viewport height in logical pixels.
        #[arg(long)]
        height: Option<u32>,

        /// Vertical field of view in degrees.
        #[arg(long)]
        fov: Option<f32>,

        /// Camera orbit radius.
        #[arg(long)]
        orbit_radius: Option<f32>,

        /// Keep the camera height fixed instead of following the pointer.
        #[arg(long)]
        no_pointer_easing: bool,

        /// Simulate this many frames without a window, then exit.
        #[arg(long)]
        headless_frames: Option<u32>,
    }

    impl From<CliArgs> for LaunchParams {
        fn from(args: CliArgs) -> Self {
            Self {
                payload: args.payload,
                config: args.config,
                width: args.width,
                height: args.height,
                fov: args.fov,
                orbit_radius: args.orbit_radius,
                no_pointer_easing: args.no_pointer_easing,
                headless_frames: args.headless_frames,
            }
        }
    }

    pub fn parse() -> LaunchParams {
        CliArgs::parse().into()
    }

    #[cfg(test)]
    pub(super) fn try_parse_from(args: &[&str]) -> Result<LaunchParams, clap::Error> {
        CliArgs::try_parse_from(args).map(Into::into)
    }
}

/// Parse launch parameters from CLI args (native) or use defaults (WASM).
pub fn parse() -> LaunchParams {
    #[cfg(not(target_family = "wasm"))]
    {
        native::parse()
    }
    #[cfg(target_family = "wasm")]
    {
        LaunchParams::default()
    }
}
