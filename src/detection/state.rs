use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::camera::FacingMode;

/// The externally visible gesture reading. Real labels and the non-label
/// statuses stay distinct by construction; rendering collapses them to
/// the display strings only at the snapshot edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureReading {
    /// No result has arrived yet.
    Awaiting,
    /// Latest label returned by the endpoint.
    Label(String),
    /// The most recent classify call failed.
    InferenceFailed,
    /// The camera could not be acquired or started.
    CameraFailed,
}

impl fmt::Display for GestureReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureReading::Awaiting => f.write_str("Waiting..."),
            GestureReading::Label(label) => f.write_str(label),
            GestureReading::InferenceFailed => f.write_str("Error"),
            GestureReading::CameraFailed => f.write_str("Camera Error"),
        }
    }
}

/// Outcome of reconciling one classify completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A result from a newer dispatch already applied, or the session
    /// tore down first; the completion is dropped.
    Stale,
    /// The completion applied but matched the visible reading.
    Unchanged,
    /// The completion applied and changed the visible reading.
    Updated,
}

/// Shared mutable state for one detection controller. The worker loop and
/// its classify tasks write through one mutex; the view layer reads
/// snapshots.
#[derive(Debug)]
pub struct DetectorState {
    gesture: GestureReading,
    gesture_revision: u64,
    rate: u32,
    detection_enabled: bool,
    facing: FacingMode,
    session_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    latest_dispatch: u64,
    applied_dispatch: u64,
}

impl DetectorState {
    pub fn new(facing: FacingMode, detection_enabled: bool) -> Self {
        Self {
            gesture: GestureReading::Awaiting,
            gesture_revision: 0,
            rate: 0,
            detection_enabled,
            facing,
            session_id: None,
            started_at: None,
            latest_dispatch: 0,
            applied_dispatch: 0,
        }
    }

    pub fn gesture(&self) -> &GestureReading {
        &self.gesture
    }

    pub fn detection_enabled(&self) -> bool {
        self.detection_enabled
    }

    pub fn set_detection_enabled(&mut self, enabled: bool) {
        self.detection_enabled = enabled;
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn set_facing(&mut self, facing: FacingMode) {
        self.facing = facing;
    }

    pub fn set_rate(&mut self, rate: u32) {
        self.rate = rate;
    }

    pub fn begin_session(&mut self, id: String, started_at: DateTime<Utc>) {
        self.session_id = Some(id);
        self.started_at = Some(started_at);
    }

    pub fn end_session(&mut self) {
        self.session_id = None;
        self.started_at = None;
    }

    /// Apply a reading through the single compare-and-set. Returns true
    /// iff the visible value changed, in which case the revision advanced.
    /// Repeats of the current reading are absorbed here, whatever their
    /// kind: a failed call after a failed call stays at one revision, and
    /// a label after a failure always lands even if the label is the one
    /// shown before the failure.
    pub fn apply_reading(&mut self, reading: GestureReading) -> bool {
        if self.gesture == reading {
            return false;
        }
        self.gesture = reading;
        self.gesture_revision += 1;
        true
    }

    /// Hand out the next dispatch generation.
    pub fn begin_dispatch(&mut self) -> u64 {
        self.latest_dispatch += 1;
        self.latest_dispatch
    }

    /// Reconcile the completion tagged `generation`. Completions apply in
    /// generation order: one is dropped only when a result from a newer
    /// dispatch has already applied, so a stale result never overwrites a
    /// newer one and a lagging but ordered stream of results still lands.
    pub fn complete_dispatch(
        &mut self,
        generation: u64,
        reading: GestureReading,
    ) -> DispatchOutcome {
        if generation <= self.applied_dispatch {
            return DispatchOutcome::Stale;
        }
        self.applied_dispatch = generation;
        if self.apply_reading(reading) {
            DispatchOutcome::Updated
        } else {
            DispatchOutcome::Unchanged
        }
    }

    /// Orphan every outstanding completion. Called at teardown so results
    /// from a closing session can never land in the next one.
    pub fn invalidate_dispatches(&mut self) {
        self.applied_dispatch = self.latest_dispatch;
    }

    pub fn snapshot(&self) -> DetectorSnapshot {
        DetectorSnapshot {
            gesture: self.gesture.to_string(),
            gesture_revision: self.gesture_revision,
            rate: self.rate,
            detection_enabled: self.detection_enabled,
            facing: self.facing,
            session_id: self.session_id.clone(),
            started_at: self.started_at,
        }
    }
}

/// Read-only view handed to the surrounding UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorSnapshot {
    pub gesture: String,
    pub gesture_revision: u64,
    pub rate: u32,
    pub detection_enabled: bool,
    pub facing: FacingMode,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}
