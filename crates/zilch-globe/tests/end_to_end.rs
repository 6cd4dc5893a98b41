//! Payload to rendered frames, through the headless backend.

use glam::Vec3;
use proptest::prelude::*;
use zilch_globe::headless::{RegisteredNode, simulate};
use zilch_globe::{
    CameraOrbitController, DistributionMeshBuilder, Error, FrameOutcome, GlobeConfig,
    HeadlessBackend, ManualScheduler, PointerTarget, RenderLoop, SceneComposer, parse_payload,
    pointer, project,
};

const PAYLOAD: &str = r#"JSON_CALLBACK([
    {"Latitude": 40, "Longitude": -74, "ZipCodes": 1200},
    {"Latitude": 51, "Longitude": 0, "ZipCodes": 300}
]);"#;

fn compose(config: &GlobeConfig, backend: &mut HeadlessBackend) -> RenderLoop<ManualScheduler> {
    let payload = parse_payload(PAYLOAD).unwrap();
    let mesh = DistributionMeshBuilder::new(config.bars, config.earth.radius).build(&payload.records);
    let scene = SceneComposer::compose(config, mesh, backend).unwrap();
    RenderLoop::from_config(config, scene, ManualScheduler::default())
}

#[test]
fn test_payload_becomes_bars_on_the_globe() {
    let config = GlobeConfig::default();
    let mut backend = HeadlessBackend::new();
    let render_loop = compose(&config, &mut backend);

    let bars = render_loop.scene().distribution.bars();
    assert_eq!(bars.len(), 2);
    assert!((bars[0].anchor - project(40.0, -74.0, 600.0, 3.0)).length() < 1e-3);
    assert!((bars[1].anchor - project(51.0, 0.0, 600.0, 3.0)).length() < 1e-3);
    assert!(bars[0].height > bars[1].height);
    assert!(bars[1].height > config.bars.min_height);

    assert_eq!(
        backend.registered().last(),
        Some(&RegisteredNode::Distribution { primitives: 2 })
    );
}

#[test]
#[allow(clippy::cast_possible_truncation)]
fn test_camera_follows_orbit_over_frames() {
    let config = GlobeConfig::default();
    let mut backend = HeadlessBackend::new();
    let mut render_loop = compose(&config, &mut backend);
    render_loop.start();

    for t in [0.0f64, 1000.0, 2000.0] {
        assert_eq!(
            render_loop.frame(t, &mut backend).unwrap(),
            FrameOutcome::Rendered
        );
        let camera = backend.last_camera().unwrap();
        let expected = Vec3::new(
            (1800.0 * (t / 10_000.0).cos()) as f32,
            0.0,
            (1800.0 * (t / 10_000.0).sin()) as f32,
        );
        assert!((camera.position - expected).length() < 1e-2);
        assert!((camera.forward() - (-expected.normalize())).length() < 1e-4);
    }
}

#[test]
fn test_pointer_tilts_camera_and_light() {
    let config = GlobeConfig::default();
    let (tracker, subscriber) = pointer::channel(config.viewport, config.pointer);
    let mut backend = HeadlessBackend::new();
    let mut render_loop = compose(&config, &mut backend).with_pointer(subscriber);
    render_loop.start();

    // Pointer at the very bottom of the viewport pulls the camera down.
    tracker.pointer_moved(500.0, 600.0);
    for i in 0..200u32 {
        render_loop.frame(f64::from(i), &mut backend).unwrap();
    }

    let camera = backend.last_camera().unwrap();
    let light = backend.last_light().unwrap();
    assert!(camera.position.y < -400.0);
    assert!(camera.position.y >= -500.0);
    assert!((light.position.y - (camera.position.y - 300.0)).abs() < 1e-3);
    let PointerTarget { x, y } = render_loop.last_pointer().unwrap();
    assert!(x.abs() < 1e-6);
    assert!((y + 510.0).abs() < 1e-3);
}

#[test]
fn test_simulated_run_releases_backend() {
    let config = GlobeConfig::default();
    let mut backend = HeadlessBackend::new();
    let mut render_loop = compose(&config, &mut backend);

    let report = simulate(&mut render_loop, &mut backend, 60, 1000.0 / 60.0).unwrap();

    assert_eq!(report.frames, 60);
    assert!(render_loop.is_stopped());
    assert!(render_loop.scheduler().is_cancelled());
    assert!(backend.is_released());
    assert!(backend.registered().is_empty());
}

#[test]
fn test_unavailable_backend_is_fatal() {
    let mut backend = HeadlessBackend::failing("no adapter");
    let result = SceneComposer::compose(
        &GlobeConfig::default(),
        zilch_globe::DistributionMesh::empty(),
        &mut backend,
    );
    assert!(matches!(result, Err(Error::BackendUnavailable { .. })));
}

proptest! {
    #[test]
    fn prop_camera_height_stays_clamped(
        moves in proptest::collection::vec((0.0f32..1000.0, 0.0f32..600.0), 1..30),
        interval in 0.0f64..50.0,
    ) {
        let config = GlobeConfig::default();
        let (tracker, subscriber) = pointer::channel(config.viewport, config.pointer);
        let mut orbit = CameraOrbitController::new(config.orbit);
        let mut camera = SceneComposer::build(&config, zilch_globe::DistributionMesh::empty()).camera;
        let mut handoff = subscriber;

        for (i, (x, y)) in moves.iter().enumerate() {
            tracker.pointer_moved(*x, *y);
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 * interval;
            orbit.tick(t, Some(handoff.latest()), &mut camera);
            prop_assert!(camera.position.y >= -500.0 && camera.position.y <= 500.0);
        }
    }
}
