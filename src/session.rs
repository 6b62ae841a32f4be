//! Per-session context
//!
//! A [`WorkoutSession`] owns the rest timer for one active workout together
//! with the threshold table and the CNS capability gate. It is passed
//! explicitly to whatever drives the display tick; there is no global state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::aggregator::{aggregate, RecoveryStatus};
use crate::config::AppConfig;
use crate::models::{ExerciseCategory, FatigueSource};
use crate::rest_timer::{RestTimer, RestTimerWire};
use crate::rest_zones::{RestStatus, RestThresholdTable};

/// Everything the presentation layer needs for one tick
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub rest_timer: RestTimerWire,
    pub rest_status: RestStatus,
    pub recovery: RecoveryStatus,
}

#[derive(Debug, Clone)]
pub struct WorkoutSession {
    id: Uuid,
    workout_id: Option<String>,
    timer: RestTimer,
    thresholds: RestThresholdTable,
    cns_enabled: bool,
}

impl WorkoutSession {
    pub fn new(thresholds: RestThresholdTable, cns_enabled: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            workout_id: None,
            timer: RestTimer::new(),
            thresholds,
            cns_enabled,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.rest, config.recovery.cns_tracking_enabled)
    }

    pub fn with_workout_id(mut self, workout_id: impl Into<String>) -> Self {
        self.workout_id = Some(workout_id.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn workout_id(&self) -> Option<&str> {
        self.workout_id.as_deref()
    }

    pub fn timer(&self) -> &RestTimer {
        &self.timer
    }

    pub fn cns_enabled(&self) -> bool {
        self.cns_enabled
    }

    /// Record a completed set; restarts the rest clock
    pub fn log_set(&mut self, at: DateTime<Utc>, category: ExerciseCategory) {
        tracing::info!(session = %self.id, %category, "Set logged");
        self.timer.start(at, category);
    }

    pub fn pause_rest(&mut self, now: DateTime<Utc>) {
        self.timer.pause(now);
    }

    pub fn resume_rest(&mut self, now: DateTime<Utc>) {
        self.timer.resume(now);
    }

    pub fn stop_rest(&mut self) {
        self.timer.stop();
    }

    /// Adopt the server's view of the rest timer
    pub fn sync_rest_timer(&mut self, remote: &RestTimerWire, now: DateTime<Utc>) {
        self.timer.reconcile(remote, now);
    }

    /// Finish the workout; the rest timer goes idle
    pub fn end_workout(&mut self) {
        tracing::info!(session = %self.id, workout = ?self.workout_id, "Workout ended");
        self.timer.stop();
    }

    pub fn rest_status(&self, now: DateTime<Utc>) -> RestStatus {
        self.timer.status(now, &self.thresholds)
    }

    /// Recompute everything from absolute timestamps
    ///
    /// Safe to call at any rate. The CNS source is dropped unless the session
    /// has CNS tracking enabled.
    pub fn tick(
        &self,
        now: DateTime<Utc>,
        muscles: &[FatigueSource],
        cns: Option<&FatigueSource>,
    ) -> SessionView {
        let cns = cns.filter(|_| self.cns_enabled);
        SessionView {
            session_id: self.id,
            rest_timer: self.timer.snapshot(now),
            rest_status: self.rest_status(now),
            recovery: aggregate(muscles, cns, now),
        }
    }
}
