//! Payload loading and globe composition.
//!
//! Reads the density payload on Bevy's IO task pool and hands the parsed
//! result back to the main thread over an `async_channel`. Once it arrives the
//! scene is composed against the Bevy backend and the render loop starts.

use std::path::Path;

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use zilch_globe::{
    DensityPayload, DistributionMeshBuilder, Error, RenderLoop, SceneComposer, parse_payload,
    pointer,
};

use crate::backend::BevyBackend;
use crate::globe::{BevyFrameScheduler, GlobeLoop, GlobeSettings};
use crate::input::PointerInput;
use crate::launch_params::LaunchParams;

/// Plugin for loading the payload and composing the globe.
pub struct PayloadLoaderPlugin;

impl Plugin for PayloadLoaderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PayloadChannel>()
            .add_systems(Startup, start_payload_load)
            .add_systems(
                Update,
                compose_globe.run_if(not(resource_exists::<GlobeLoop>)),
            );
    }
}

/// Summary of the loaded payload.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PayloadStats {
    pub records: usize,
    pub skipped: usize,
    pub total_count: u64,
}

/// Channel for receiving the parsed payload from the IO task.
#[derive(Resource)]
pub struct PayloadChannel {
    tx: async_channel::Sender<zilch_globe::Result<DensityPayload>>,
    rx: async_channel::Receiver<zilch_globe::Result<DensityPayload>>,
}

impl Default for PayloadChannel {
    fn default() -> Self {
        let (tx, rx) = async_channel::bounded(1);
        Self { tx, rx }
    }
}

/// Read and parse a payload file.
pub fn read_payload(path: &Path) -> zilch_globe::Result<DensityPayload> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_payload(&text)
}

/// Start reading the payload, or deliver an empty one if none was given.
#[allow(clippy::needless_pass_by_value)]
fn start_payload_load(params: Res<LaunchParams>, channel: Res<PayloadChannel>) {
    let tx = channel.tx.clone();

    let Some(path) = params.payload.clone() else {
        tracing::info!("No payload given; rendering the globe without bars");
        let _ = tx.try_send(Ok(DensityPayload::default()));
        return;
    };

    tracing::info!("Loading density payload from {}", path.display());
    IoTaskPool::get()
        .spawn(async move {
            let result = read_payload(&path);
            let _ = tx.send(result).await;
        })
        .detach();
}

/// Compose the globe once the payload has arrived.
#[allow(clippy::needless_pass_by_value)]
fn compose_globe(
    mut commands: Commands,
    channel: Res<PayloadChannel>,
    settings: Res<GlobeSettings>,
    mut backend: BevyBackend,
    mut exit: MessageWriter<AppExit>,
) {
    let Ok(result) = channel.rx.try_recv() else {
        return;
    };

    let payload = match result {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("Failed to load density payload: {e}");
            exit.write(AppExit::error());
            return;
        }
    };

    let config = &settings.0;
    let mesh =
        DistributionMeshBuilder::new(config.bars, config.earth.radius).build(&payload.records);

    let scene = match SceneComposer::compose(config, mesh, &mut backend) {
        Ok(scene) => scene,
        Err(e) => {
            tracing::error!("Cannot render the globe: {e}");
            exit.write(AppExit::error());
            return;
        }
    };

    let (tracker, subscriber) = pointer::channel(config.viewport, config.pointer);
    let mut render_loop = RenderLoop::from_config(config, scene, BevyFrameScheduler::default())
        .with_pointer(subscriber);
    render_loop.start();

    commands.insert_resource(PayloadStats {
        records: payload.records.len(),
        skipped: payload.skipped,
        total_count: payload.total_count(),
    });
    commands.insert_resource(PointerInput(tracker));
    commands.insert_resource(GlobeLoop(render_loop));
}
