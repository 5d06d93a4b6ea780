use std::sync::Arc;

use anyhow::Result;
use gesturecam::camera::test_pattern::TestPatternBackend;
use gesturecam::{CaptureConfig, DetectionController};
use log::info;
use tokio::time::Duration;

/// Demo runner: drives the detection loop against the synthetic camera
/// and logs a snapshot every couple of seconds. Point GESTURECAM_ENDPOINT
/// at a real inference server to see labels instead of errors.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut config = CaptureConfig::default();
    if let Ok(endpoint) = std::env::var("GESTURECAM_ENDPOINT") {
        config.endpoint = endpoint;
    }

    info!("gesturecam starting against {}", config.endpoint);

    let backend = Arc::new(TestPatternBackend::default());
    let mut controller = DetectionController::new(config, backend);
    controller.start().await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_secs(2)) => {
                let snapshot = controller.snapshot().await;
                info!(
                    "gesture=\"{}\" rate={} detection={}",
                    snapshot.gesture, snapshot.rate, snapshot.detection_enabled
                );
            }
        }
    }

    info!("gesturecam shutting down");
    controller.stop().await
}
