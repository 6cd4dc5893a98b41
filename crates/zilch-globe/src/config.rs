//! Tunable parameters for the globe.
//!
//! Every constant the scene, orbit and pointer code depends on lives here so
//! embedders can override it. Defaults match the zilch web globe.
//! A config can be read from JSON; missing fields fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Complete globe configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub viewport: ViewportConfig,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub earth: EarthConfig,
    /// Concentric cloud shells, innermost first. May be empty.
    pub clouds: Vec<CloudShellConfig>,
    pub light: LightConfig,
    pub bars: BarConfig,
    pub pointer: PointerConfig,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            camera: CameraConfig::default(),
            orbit: OrbitConfig::default(),
            earth: EarthConfig::default(),
            clouds: vec![CloudShellConfig::default()],
            light: LightConfig::default(),
            bars: BarConfig::default(),
            pointer: PointerConfig::default(),
        }
    }
}

/// Logical output resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
        }
    }
}

impl ViewportConfig {
    /// Width divided by height.
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Center of the viewport in pixels.
    #[allow(clippy::cast_precision_loss)]
    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 1.0,
            far: 4000.0,
        }
    }
}

/// Camera orbit and vertical easing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Horizontal distance between camera and world origin.
    pub radius: f32,
    /// Orbit rate in radians per millisecond.
    pub angular_rate: f64,
    /// Vertical offset before any easing has happened.
    pub initial_height: f32,
    /// Lowest allowed vertical offset.
    pub min_height: f32,
    /// Highest allowed vertical offset.
    pub max_height: f32,
    /// The easing step is `gap / (easing_divisor * elapsed_ms)`.
    pub easing_divisor: f32,
    /// Whether the vertical offset follows the pointer.
    pub pointer_easing: bool,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            radius: 1800.0,
            angular_rate: 1.0 / 10_000.0,
            initial_height: 0.0,
            min_height: -500.0,
            max_height: 500.0,
            easing_divisor: 2.0,
            pointer_easing: true,
        }
    }
}

impl OrbitConfig {
    /// Clamp a vertical offset into the allowed range.
    ///
    /// Never panics; an inverted range resolves to `max_height` and NaN bounds
    /// are ignored. [`GlobeConfig::validate`] rejects both.
    pub fn clamp_height(&self, height: f32) -> f32 {
        height.max(self.min_height).min(self.max_height)
    }
}

/// Earth sphere parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarthConfig {
    pub radius: f32,
    /// Sectors and stacks of the UV sphere.
    pub segments: u32,
    /// Asset path of the surface texture.
    pub texture: String,
    pub shininess: f32,
}

impl Default for EarthConfig {
    fn default() -> Self {
        Self {
            radius: 600.0,
            segments: 50,
            texture: "images/world-big-2-grey.jpg".to_string(),
            shininess: 0.2,
        }
    }
}

/// One translucent cloud shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudShellConfig {
    /// Scale relative to the earth radius. Must be above 1.
    pub scale: f32,
    pub opacity: f32,
    /// Drift rate around the vertical axis, radians per millisecond.
    pub rotation_rate: f64,
    pub texture: String,
}

impl Default for CloudShellConfig {
    fn default() -> Self {
        Self {
            scale: 1.025,
            opacity: 0.1,
            rotation_rate: 1.0 / 40_000.0,
            texture: "images/earth_clouds_1024.png".to_string(),
        }
    }
}

/// Directional light parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Packed `0xRRGGBB` colour.
    pub color: u32,
    pub intensity: f32,
    /// Offset added to the camera's Y when the light mirrors it.
    pub vertical_offset: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: 0x5555ff,
            intensity: 3.5,
            vertical_offset: -300.0,
        }
    }
}

/// Density bar geometry and material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    /// Side length of the square bar footprint.
    pub footprint: f32,
    /// Height of the bar base above the earth surface.
    pub elevation: f32,
    /// Height of a bar with a zero count.
    pub min_height: f32,
    /// Count represented by one unit of bar height.
    pub count_scale: f32,
    /// Packed `0xRRGGBB` base colour.
    pub color: u32,
    /// Packed `0xRRGGBB` emissive colour.
    pub emissive: u32,
    pub opacity: f32,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            footprint: 5.0,
            elevation: 3.0,
            min_height: 1.0,
            count_scale: 12.0,
            color: 0x000000,
            emissive: 0xeeeeff,
            opacity: 0.7,
        }
    }
}

/// Pointer-to-target scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    pub horizontal_gain: f32,
    /// Exaggerates vertical sensitivity.
    pub vertical_gain: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            horizontal_gain: 1.0,
            vertical_gain: 1.7,
        }
    }
}

impl GlobeConfig {
    /// Parse a JSON config, filling missing fields from the defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::InvalidConfig {
            field: "<root>",
            detail: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::info!("Loaded globe config from {}", path.display());
        Ok(config)
    }

    /// Check that every value is in a range the engine can work with.
    pub fn validate(&self) -> Result<()> {
        fn invalid(field: &'static str, detail: impl Into<String>) -> Error {
            Error::InvalidConfig {
                field,
                detail: detail.into(),
            }
        }

        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(invalid(
                "viewport",
                format!(
                    "resolution must be non-zero, got {}x{}",
                    self.viewport.width, self.viewport.height
                ),
            ));
        }
        if !positive(self.camera.fov_degrees) || self.camera.fov_degrees >= 180.0 {
            return Err(invalid(
                "camera.fov_degrees",
                format!("must be in (0, 180), got {}", self.camera.fov_degrees),
            ));
        }
        if !positive(self.camera.near) || self.camera.near >= self.camera.far {
            return Err(invalid(
                "camera.near",
                format!(
                    "must be positive and below far ({}), got {}",
                    self.camera.far, self.camera.near
                ),
            ));
        }
        if !positive(self.orbit.radius) {
            return Err(invalid(
                "orbit.radius",
                format!("must be positive, got {}", self.orbit.radius),
            ));
        }
        if !self.orbit.angular_rate.is_finite() {
            return Err(invalid(
                "orbit.angular_rate",
                format!("must be finite, got {}", self.orbit.angular_rate),
            ));
        }
        for (field, bound) in [
            ("orbit.min_height", self.orbit.min_height),
            ("orbit.max_height", self.orbit.max_height),
            ("orbit.initial_height", self.orbit.initial_height),
        ] {
            if !bound.is_finite() {
                return Err(invalid(field, format!("must be finite, got {bound}")));
            }
        }
        let reach = self.orbit.radius.hypot(
            self.orbit
                .min_height
                .abs()
                .max(self.orbit.max_height.abs()),
        );
        if reach >= self.camera.far {
            return Err(invalid(
                "camera.far",
                format!("must exceed the farthest orbit distance {reach:.1}"),
            ));
        }
        if self.orbit.min_height > self.orbit.max_height {
            return Err(invalid(
                "orbit.min_height",
                format!(
                    "{} is above max_height {}",
                    self.orbit.min_height, self.orbit.max_height
                ),
            ));
        }
        if !positive(self.orbit.easing_divisor) {
            return Err(invalid(
                "orbit.easing_divisor",
                format!("must be positive, got {}", self.orbit.easing_divisor),
            ));
        }
        if !positive(self.earth.radius) {
            return Err(invalid(
                "earth.radius",
                format!("must be positive, got {}", self.earth.radius),
            ));
        }
        if self.earth.segments < 3 {
            return Err(invalid(
                "earth.segments",
                format!("need at least 3, got {}", self.earth.segments),
            ));
        }
        for shell in &self.clouds {
            if !positive(shell.scale - 1.0) {
                return Err(invalid(
                    "clouds.scale",
                    format!("shells must be larger than the earth, got {}", shell.scale),
                ));
            }
            if !shell.rotation_rate.is_finite() {
                return Err(invalid(
                    "clouds.rotation_rate",
                    format!("must be finite, got {}", shell.rotation_rate),
                ));
            }
            if !(0.0..=1.0).contains(&shell.opacity) {
                return Err(invalid(
                    "clouds.opacity",
                    format!("must be in [0, 1], got {}", shell.opacity),
                ));
            }
        }
        if !positive(self.bars.min_height) {
            return Err(invalid(
                "bars.min_height",
                format!("must be positive, got {}", self.bars.min_height),
            ));
        }
        if !positive(self.bars.count_scale) {
            return Err(invalid(
                "bars.count_scale",
                format!("must be positive, got {}", self.bars.count_scale),
            ));
        }
        if !positive(self.bars.footprint) {
            return Err(invalid(
                "bars.footprint",
                format!("must be positive, got {}", self.bars.footprint),
            ));
        }
        if self.earth.radius + self.bars.elevation <= 0.0 {
            return Err(invalid(
                "bars.elevation",
                "bar anchors would sit at or below the sphere centre",
            ));
        }
        Ok(())
    }
}

/// Split a packed `0xRRGGBB` colour into `[r, g, b]` in 0..=1.
pub fn unpack_rgb(color: u32) -> [f32; 3] {
    let [_, r, g, b] = color.to_be_bytes();
    [f32::from(r) / 255.0, f32::from(g) / 255.0, f32::from(b) / 255.0]
}

/// False for zero, negative and NaN values.
fn positive(value: f32) -> bool {
    value > 0.0
}
