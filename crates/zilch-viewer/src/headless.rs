//! Windowless simulation of the globe.
//!
//! Runs the same composition and render loop as the windowed viewer against a
//! recording backend, so payloads and configs can be checked without a GPU.

use zilch_globe::headless::{HeadlessReport, simulate};
use zilch_globe::{
    DensityPayload, DistributionMeshBuilder, GlobeConfig, HeadlessBackend, ManualScheduler,
    RenderLoop, SceneComposer,
};

use crate::launch_params::{HEADLESS_FRAME_INTERVAL_MS, LaunchParams};
use crate::loader::read_payload;

/// Simulate `frames` frames and report where the camera ended up.
pub fn run(
    params: &LaunchParams,
    config: &GlobeConfig,
    frames: u32,
) -> zilch_globe::Result<HeadlessReport> {
    let payload = match &params.payload {
        Some(path) => read_payload(path)?,
        None => DensityPayload::default(),
    };
    tracing::info!(
        "Headless run: {} records ({} skipped), {frames} frames",
        payload.records.len(),
        payload.skipped
    );

    let mesh =
        DistributionMeshBuilder::new(config.bars, config.earth.radius).build(&payload.records);
    let mut backend = HeadlessBackend::new();
    let scene = SceneComposer::compose(config, mesh, &mut backend)?;
    let mut render_loop = RenderLoop::from_config(config, scene, ManualScheduler::default());

    let report = simulate(
        &mut render_loop,
        &mut backend,
        frames,
        HEADLESS_FRAME_INTERVAL_MS,
    )?;

    let position = report.final_camera.position;
    tracing::info!(
        "Camera after {:.0} ms: ({:.1}, {:.1}, {:.1})",
        report.elapsed_ms,
        position.x,
        position.y,
        position.z
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_without_payload() {
        let report = run(&LaunchParams::default(), &GlobeConfig::default(), 30).unwrap();
        assert_eq!(report.frames, 30);
        assert!((report.final_camera.position.length() - 1800.0).abs() < 1e-2);
    }

    #[test]
    fn test_run_with_missing_payload_fails() {
        let params = LaunchParams {
            payload: Some("/nonexistent/zips.json".into()),
            ..LaunchParams::default()
        };
        assert!(run(&params, &GlobeConfig::default(), 1).is_err());
    }
}
