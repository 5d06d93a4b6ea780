use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::warn;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::camera::{CameraBackend, CaptureSession, FacingMode};
use crate::config::CaptureConfig;
use crate::inference::InferenceClient;

use super::loop_worker::{detection_loop, LoopContext};
use super::state::{DetectorSnapshot, DetectorState, GestureReading};

/// Owns the capture loop and all shared detector state. The embedding
/// layer calls the action methods and polls [`snapshot`](Self::snapshot);
/// nothing else reaches into the loop.
pub struct DetectionController {
    state: Arc<Mutex<DetectorState>>,
    config: CaptureConfig,
    backend: Arc<dyn CameraBackend>,
    client: InferenceClient,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl DetectionController {
    pub fn new(config: CaptureConfig, backend: Arc<dyn CameraBackend>) -> Self {
        let client = InferenceClient::new(config.endpoint.clone(), config.request_timeout());
        let state = Arc::new(Mutex::new(DetectorState::new(
            config.facing,
            config.detection_enabled,
        )));
        Self {
            state,
            config,
            backend,
            client,
            handle: None,
            cancel_token: None,
        }
    }

    /// Acquire the camera and spawn the capture loop.
    ///
    /// A camera failure is an expected outcome, not an `Err`: it is
    /// recorded as the camera error reading and the loop stays down until
    /// the facing mode changes (the retry path). `Err` is reserved for
    /// misuse, i.e. starting while already active.
    pub async fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            bail!("detection already active");
        }

        let facing = self.state.lock().await.facing();
        let session = match CaptureSession::acquire(self.backend.as_ref(), facing) {
            Ok(session) => session,
            Err(err) => {
                warn!("camera acquisition failed: {err}");
                self.state
                    .lock()
                    .await
                    .apply_reading(GestureReading::CameraFailed);
                return Ok(());
            }
        };

        {
            let mut state = self.state.lock().await;
            state.begin_session(session.id().to_string(), session.started_at());
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let ctx = LoopContext {
            state: Arc::clone(&self.state),
            client: self.client.clone(),
            tick_interval: self.config.tick_interval(),
            sample_interval: self.config.sample_interval(),
            rate_window: self.config.rate_window(),
            max_dimension: self.config.max_dimension,
            jpeg_quality: self.config.jpeg_quality,
        };
        let handle = tokio::spawn(detection_loop(ctx, session, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Tear the loop down and release the camera. Waits for the worker to
    /// exit, then orphans any classify calls still in flight so their
    /// results can never land in a later session. Idempotent; stopping an
    /// inactive controller is a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle.await.context("detection loop task failed to join")?;
        }

        let mut state = self.state.lock().await;
        state.invalidate_dispatches();
        state.end_session();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Flip whether samples are dispatched. The loop itself keeps ticking
    /// either way; only dispatching pauses.
    pub async fn set_detection_enabled(&self, enabled: bool) {
        self.state.lock().await.set_detection_enabled(enabled);
    }

    /// Toggle sampling and return the new value.
    pub async fn toggle_detection(&self) -> bool {
        let mut state = self.state.lock().await;
        let enabled = !state.detection_enabled();
        state.set_detection_enabled(enabled);
        enabled
    }

    /// Switch cameras with a full stop/start cycle: the old session is
    /// released before the new one is acquired, so two streams are never
    /// live at once. Also the retry path out of a camera failure.
    pub async fn set_facing(&mut self, facing: FacingMode) -> Result<()> {
        self.stop().await?;
        self.state.lock().await.set_facing(facing);
        self.start().await
    }

    pub async fn toggle_facing(&mut self) -> Result<()> {
        let facing = self.state.lock().await.facing().toggled();
        self.set_facing(facing).await
    }

    pub async fn snapshot(&self) -> DetectorSnapshot {
        self.state.lock().await.snapshot()
    }
}
