use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::camera::CaptureSession;
use crate::inference::InferenceClient;
use crate::metrics::RateMeter;
use crate::sampler::{self, SamplerConfig};

use super::state::{DetectorState, DispatchOutcome, GestureReading};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_error, log_info};

/// Everything the loop needs besides the camera session it owns.
pub(crate) struct LoopContext {
    pub state: Arc<Mutex<DetectorState>>,
    pub client: InferenceClient,
    pub tick_interval: Duration,
    pub sample_interval: Duration,
    pub rate_window: Duration,
    pub max_dimension: Option<u32>,
    pub jpeg_quality: u8,
}

/// The capture-and-poll loop. Ticks at display cadence, feeds the rate
/// meter on every tick, and dispatches a sample whenever the throttle
/// allows. Classify calls run on their own tasks so a slow endpoint never
/// stalls the ticker; the dispatch generation decides whose result still
/// counts. Runs until cancelled, then releases the camera.
pub(crate) async fn detection_loop(
    ctx: LoopContext,
    mut session: CaptureSession,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(ctx.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut meter = RateMeter::new(ctx.rate_window);
    let mut last_dispatch: Option<Instant> = None;
    let mirror = session.facing().mirrors_preview();

    log_info!(
        "detection loop running against {} (session {})",
        ctx.client.endpoint(),
        session.id()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();

                let published = meter.tick(now);
                let enabled = {
                    let mut state = ctx.state.lock().await;
                    if let Some(rate) = published {
                        state.set_rate(rate);
                    }
                    state.detection_enabled()
                };

                if !should_dispatch(enabled, last_dispatch, now, ctx.sample_interval) {
                    continue;
                }

                let config = SamplerConfig {
                    max_dimension: ctx.max_dimension,
                    mirror,
                    jpeg_quality: ctx.jpeg_quality,
                };
                let Some(still) = sampler::sample(session.source_mut(), &config) else {
                    // No frame yet (or encode failure); the throttle is not
                    // consumed, so the next ready tick dispatches.
                    continue;
                };

                last_dispatch = Some(now);
                let generation = ctx.state.lock().await.begin_dispatch();
                log_info!(
                    "dispatch #{generation}: {}x{} still ({} bytes) from session {}",
                    still.width,
                    still.height,
                    still.data_uri.len(),
                    session.id()
                );

                let state = Arc::clone(&ctx.state);
                let client = ctx.client.clone();
                tokio::spawn(async move {
                    let reading = match client.classify(&still).await {
                        Ok(label) => GestureReading::Label(label),
                        Err(err) => {
                            log_error!("classify failed for dispatch #{generation}: {err}");
                            GestureReading::InferenceFailed
                        }
                    };

                    let mut state = state.lock().await;
                    match state.complete_dispatch(generation, reading) {
                        DispatchOutcome::Updated => {
                            log_info!(
                                "gesture is now \"{}\" (dispatch #{generation})",
                                state.gesture()
                            );
                        }
                        DispatchOutcome::Stale => {
                            log_info!("discarding stale result for dispatch #{generation}");
                        }
                        DispatchOutcome::Unchanged => {}
                    }
                });
            }
            _ = cancel_token.cancelled() => {
                log_info!("detection loop shutting down");
                break;
            }
        }
    }

    session.release();
}

/// The per-tick dispatch predicate: detection must be enabled, and either
/// nothing has been dispatched yet or the sample interval has fully
/// elapsed since the last dispatch.
fn should_dispatch(
    enabled: bool,
    last_dispatch: Option<Instant>,
    now: Instant,
    sample_interval: Duration,
) -> bool {
    if !enabled {
        return false;
    }
    let Some(last) = last_dispatch else {
        return true;
    };
    now.duration_since(last) > sample_interval
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(1000);

    #[test]
    fn disabled_detection_never_dispatches() {
        let base = Instant::now();
        assert!(!should_dispatch(false, None, base, INTERVAL));
        assert!(!should_dispatch(
            false,
            Some(base),
            base + Duration::from_secs(10),
            INTERVAL
        ));
    }

    #[test]
    fn the_first_eligible_tick_dispatches_immediately() {
        assert!(should_dispatch(true, None, Instant::now(), INTERVAL));
    }

    #[test]
    fn ticks_inside_the_interval_hold() {
        let base = Instant::now();
        assert!(!should_dispatch(true, Some(base), base + Duration::from_millis(999), INTERVAL));
        // Exactly on the interval is still strictly "not past it".
        assert!(!should_dispatch(true, Some(base), base + Duration::from_millis(1000), INTERVAL));
    }

    #[test]
    fn ticks_past_the_interval_dispatch() {
        let base = Instant::now();
        assert!(should_dispatch(true, Some(base), base + Duration::from_millis(1001), INTERVAL));
    }

    #[test]
    fn reenabling_reuses_the_stale_throttle_timestamp() {
        // While detection is off the throttle timestamp goes stale; once
        // the interval has passed, the first enabled tick dispatches
        // rather than waiting out a fresh interval.
        let base = Instant::now();
        let last = Some(base);
        let now = base + Duration::from_millis(5000);
        assert!(!should_dispatch(false, last, now, INTERVAL));
        assert!(should_dispatch(true, last, now, INTERVAL));
    }
}
