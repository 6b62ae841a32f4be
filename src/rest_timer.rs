//! Rest timer between sets
//!
//! The timer counts up from the last completed set. Pausing freezes the
//! elapsed value; resuming re-anchors the timer at `now - frozen_elapsed` so
//! it continues from where it stopped instead of jumping ahead by the time
//! spent paused.
//!
//! ```text
//!            start                 pause
//!   Idle ───────────▶ Running ───────────▶ Paused
//!    ▲                  ▲  │                 │
//!    │      stop        │  └─────resume──────┘
//!    └──────────────────┴── (start from any state restarts)
//! ```
//!
//! All elapsed values are derived from absolute instants, so the display tick
//! can be skipped or coalesced without drift.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ExerciseCategory;
use crate::numeric::{normalize_timestamp, Numeric};
use crate::rest_zones::{RestStatus, RestThresholdTable};

/// Category used for thresholds when none is known
pub const DEFAULT_CATEGORY: ExerciseCategory = ExerciseCategory::Compound;

/// Internal state of the rest timer
#[derive(Debug, Clone, PartialEq)]
pub enum TimerPhase {
    /// No active rest interval
    Idle,
    /// Counting up from `anchor`
    Running {
        anchor: DateTime<Utc>,
        last_set: DateTime<Utc>,
        category: ExerciseCategory,
    },
    /// Frozen at `frozen_elapsed`
    Paused {
        frozen_elapsed: Duration,
        last_set: DateTime<Utc>,
        category: ExerciseCategory,
    },
}

/// Rest timer for one workout session
#[derive(Debug, Clone, PartialEq)]
pub struct RestTimer {
    phase: TimerPhase,
}

impl Default for RestTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RestTimer {
    pub fn new() -> Self {
        Self {
            phase: TimerPhase::Idle,
        }
    }

    pub fn phase(&self) -> &TimerPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, TimerPhase::Idle)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.phase, TimerPhase::Paused { .. })
    }

    pub fn category(&self) -> Option<ExerciseCategory> {
        match &self.phase {
            TimerPhase::Idle => None,
            TimerPhase::Running { category, .. } | TimerPhase::Paused { category, .. } => {
                Some(*category)
            }
        }
    }

    pub fn last_set_timestamp(&self) -> Option<DateTime<Utc>> {
        match &self.phase {
            TimerPhase::Idle => None,
            TimerPhase::Running { last_set, .. } | TimerPhase::Paused { last_set, .. } => {
                Some(*last_set)
            }
        }
    }

    /// Begin a fresh rest interval after a logged set
    ///
    /// Valid from every state; any pause bookkeeping is discarded.
    pub fn start(&mut self, timestamp: DateTime<Utc>, category: ExerciseCategory) {
        tracing::debug!(%timestamp, %category, "Rest timer started");
        self.phase = TimerPhase::Running {
            anchor: timestamp,
            last_set: timestamp,
            category,
        };
    }

    /// Begin a rest interval that has already been running for `elapsed_seconds`
    ///
    /// Negative or absent values start at zero; values older than the calendar
    /// saturate at its earliest instant.
    pub fn start_with_elapsed(
        &mut self,
        now: DateTime<Utc>,
        elapsed_seconds: Numeric,
        category: ExerciseCategory,
    ) {
        let anchor = anchor_before(now, seconds_to_duration(elapsed_seconds.unwrap_or(0.0), now));
        self.start(anchor, category);
    }

    /// Freeze the timer; no-op unless running
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if let TimerPhase::Running {
            anchor,
            last_set,
            category,
        } = self.phase
        {
            let frozen_elapsed = clamp_non_negative(now - anchor);
            tracing::debug!(frozen_ms = frozen_elapsed.num_milliseconds(), "Rest timer paused");
            self.phase = TimerPhase::Paused {
                frozen_elapsed,
                last_set,
                category,
            };
        }
    }

    /// Continue from the frozen value; no-op unless paused
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if let TimerPhase::Paused {
            frozen_elapsed,
            last_set,
            category,
        } = self.phase
        {
            tracing::debug!(frozen_ms = frozen_elapsed.num_milliseconds(), "Rest timer resumed");
            self.phase = TimerPhase::Running {
                anchor: anchor_before(now, frozen_elapsed),
                last_set,
                category,
            };
        }
    }

    /// Clear the timer
    pub fn stop(&mut self) {
        if !self.is_idle() {
            tracing::debug!("Rest timer stopped");
        }
        self.phase = TimerPhase::Idle;
    }

    /// Rest accumulated at `now`, excluding paused time
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match &self.phase {
            TimerPhase::Idle => Duration::zero(),
            TimerPhase::Running { anchor, .. } => clamp_non_negative(now - *anchor),
            TimerPhase::Paused { frozen_elapsed, .. } => *frozen_elapsed,
        }
    }

    /// Elapsed rest in seconds with millisecond precision
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        self.elapsed(now).num_milliseconds() as f64 / 1000.0
    }

    /// Classify the current rest interval
    ///
    /// An idle timer is always "early" against the default category row.
    pub fn status(&self, now: DateTime<Utc>, table: &RestThresholdTable) -> RestStatus {
        let category = self.category().unwrap_or(DEFAULT_CATEGORY);
        RestStatus::evaluate(self.elapsed_seconds(now), category, table)
    }

    /// Adopt a server-provided timer state, discarding local drift
    ///
    /// The reported `elapsed_seconds` is trusted over the local clock; when it
    /// is absent, elapsed is derived from `last_set_timestamp`.
    pub fn reconcile(&mut self, remote: &RestTimerWire, now: DateTime<Utc>) {
        let Some(last_set) = normalize_timestamp(remote.last_set_timestamp.as_deref()) else {
            self.stop();
            return;
        };

        let category = remote
            .last_exercise_category
            .as_deref()
            .and_then(|c| c.parse::<ExerciseCategory>().ok())
            .or_else(|| self.category())
            .unwrap_or(DEFAULT_CATEGORY);

        let elapsed = match remote.elapsed_seconds {
            Numeric::Value(secs) => seconds_to_duration(secs, now),
            Numeric::Absent => clamp_non_negative(now - last_set),
        };

        tracing::debug!(
            %last_set,
            elapsed_ms = elapsed.num_milliseconds(),
            paused = remote.is_paused,
            "Rest timer reconciled with remote state"
        );

        self.phase = if remote.is_paused {
            TimerPhase::Paused {
                frozen_elapsed: elapsed,
                last_set,
                category,
            }
        } else {
            TimerPhase::Running {
                anchor: anchor_before(now, elapsed),
                last_set,
                category,
            }
        };
    }

    /// Boundary representation at `now`
    pub fn snapshot(&self, now: DateTime<Utc>) -> RestTimerWire {
        RestTimerWire {
            last_set_timestamp: self
                .last_set_timestamp()
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            last_exercise_category: self.category().map(|c| c.to_string()),
            elapsed_seconds: Numeric::Value(self.elapsed(now).num_seconds() as f64),
            is_paused: self.is_paused(),
        }
    }
}

/// Rest timer state as exchanged with external collaborators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestTimerWire {
    #[serde(default)]
    pub last_set_timestamp: Option<String>,

    #[serde(default)]
    pub last_exercise_category: Option<String>,

    #[serde(default)]
    pub elapsed_seconds: Numeric,

    #[serde(default)]
    pub is_paused: bool,
}

/// Non-negative duration of `secs`, capped so `now - duration` stays on the calendar
fn seconds_to_duration(secs: f64, now: DateTime<Utc>) -> Duration {
    let longest = now - DateTime::<Utc>::MIN_UTC;
    // `as i64` saturates for values beyond the duration range
    Duration::try_milliseconds((secs.max(0.0) * 1000.0).round() as i64)
        .map_or(longest, |d| d.min(longest))
}

fn anchor_before(now: DateTime<Utc>, elapsed: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(elapsed)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn clamp_non_negative(d: Duration) -> Duration {
    if d < Duration::zero() {
        Duration::zero()
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest_zones::RestZone;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 18, 0, 0).unwrap()
    }

    fn secs(n: i64) -> Duration {
        Duration::seconds(n)
    }

    #[test]
    fn test_idle_timer() {
        let timer = RestTimer::new();
        let status = timer.status(t0(), &RestThresholdTable::default());

        assert_eq!(timer.elapsed_seconds(t0()), 0.0);
        assert_eq!(status.zone, RestZone::Early);
        assert!(timer.last_set_timestamp().is_none());
    }

    #[test]
    fn test_running_counts_up() {
        let mut timer = RestTimer::new();
        timer.start(t0(), ExerciseCategory::Compound);

        assert_eq!(timer.elapsed_seconds(t0() + secs(90)), 90.0);
        let status = timer.status(t0() + secs(90), &RestThresholdTable::default());
        assert_eq!(status.zone, RestZone::Approaching);

        let status = timer.status(t0() + secs(310), &RestThresholdTable::default());
        assert_eq!(status.zone, RestZone::Overdue);
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let mut timer = RestTimer::new();
        timer.start(t0(), ExerciseCategory::Isolation);

        timer.pause(t0() + secs(40));
        assert!(timer.is_paused());
        assert_eq!(timer.elapsed_seconds(t0() + secs(40)), 40.0);
        assert_eq!(timer.elapsed_seconds(t0() + secs(4000)), 40.0);

        timer.resume(t0() + secs(100));
        assert_eq!(timer.elapsed_seconds(t0() + secs(100)), 40.0);
        assert_eq!(timer.elapsed_seconds(t0() + secs(110)), 50.0);
        assert_eq!(timer.last_set_timestamp(), Some(t0()));
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut timer = RestTimer::new();
        timer.start(t0(), ExerciseCategory::Compound);
        timer.pause(t0() + secs(30));
        timer.pause(t0() + secs(90));
        assert_eq!(timer.elapsed_seconds(t0() + secs(120)), 30.0);
    }

    #[test]
    fn test_resume_and_pause_ignored_when_idle_or_running() {
        let mut timer = RestTimer::new();
        timer.pause(t0());
        timer.resume(t0());
        assert!(timer.is_idle());

        timer.start(t0(), ExerciseCategory::Compound);
        timer.resume(t0() + secs(50));
        assert_eq!(timer.elapsed_seconds(t0() + secs(60)), 60.0);
    }

    #[test]
    fn test_multiple_pauses_accumulate_exactly() {
        let mut timer = RestTimer::new();
        timer.start(t0(), ExerciseCategory::Compound);
        timer.pause(t0() + secs(10));
        timer.resume(t0() + secs(25));
        timer.pause(t0() + secs(35));
        timer.resume(t0() + secs(95));

        // 10s, then 10s, then 5s of running time
        assert_eq!(timer.elapsed_seconds(t0() + secs(100)), 25.0);
    }

    #[test]
    fn test_new_set_restarts_clock() {
        let mut timer = RestTimer::new();
        timer.start(t0(), ExerciseCategory::Compound);
        timer.pause(t0() + secs(60));

        timer.start(t0() + secs(200), ExerciseCategory::Isolation);
        assert!(!timer.is_paused());
        assert_eq!(timer.category(), Some(ExerciseCategory::Isolation));
        assert_eq!(timer.elapsed_seconds(t0() + secs(210)), 10.0);
    }

    #[test]
    fn test_stop_clears_state() {
        let mut timer = RestTimer::new();
        timer.start(t0(), ExerciseCategory::Compound);
        timer.stop();
        assert!(timer.is_idle());
        assert!(timer.category().is_none());
        assert_eq!(timer.elapsed_seconds(t0() + secs(1000)), 0.0);
    }

    #[test]
    fn test_future_set_timestamp_reads_zero() {
        let mut timer = RestTimer::new();
        timer.start(t0() + secs(5), ExerciseCategory::Compound);
        assert_eq!(timer.elapsed_seconds(t0()), 0.0);
    }

    #[test]
    fn test_reconcile_trusts_remote_elapsed() {
        let mut timer = RestTimer::new();
        timer.start(t0(), ExerciseCategory::Compound);

        let remote = RestTimerWire {
            last_set_timestamp: Some("2024-06-10T18:00:00Z".to_string()),
            last_exercise_category: Some("isolation".to_string()),
            elapsed_seconds: Numeric::Value(75.0),
            is_paused: false,
        };
        let now = t0() + secs(120);
        timer.reconcile(&remote, now);

        assert_eq!(timer.elapsed_seconds(now), 75.0);
        assert_eq!(timer.elapsed_seconds(now + secs(5)), 80.0);
        assert_eq!(timer.category(), Some(ExerciseCategory::Isolation));
    }

    #[test]
    fn test_reconcile_paused_and_missing_elapsed() {
        let mut timer = RestTimer::new();
        let remote = RestTimerWire {
            last_set_timestamp: Some("2024-06-10T18:00:00Z".to_string()),
            last_exercise_category: None,
            elapsed_seconds: Numeric::Absent,
            is_paused: true,
        };
        timer.reconcile(&remote, t0() + secs(45));

        assert!(timer.is_paused());
        assert_eq!(timer.elapsed_seconds(t0() + secs(500)), 45.0);
        assert_eq!(timer.category(), Some(DEFAULT_CATEGORY));
    }

    #[test]
    fn test_reconcile_without_timestamp_goes_idle() {
        let mut timer = RestTimer::new();
        timer.start(t0(), ExerciseCategory::Compound);
        timer.reconcile(&RestTimerWire::default(), t0() + secs(10));
        assert!(timer.is_idle());
    }

    #[test]
    fn test_snapshot_shape() {
        let mut timer = RestTimer::new();
        timer.start(t0(), ExerciseCategory::Compound);
        let wire = timer.snapshot(t0() + Duration::milliseconds(61_900));

        assert_eq!(wire.last_set_timestamp.as_deref(), Some("2024-06-10T18:00:00.000Z"));
        assert_eq!(wire.last_exercise_category.as_deref(), Some("compound"));
        assert_eq!(wire.elapsed_seconds, Numeric::Value(61.0));
        assert!(!wire.is_paused);

        let json = serde_json::to_value(RestTimer::new().snapshot(t0())).unwrap();
        assert!(json["last_set_timestamp"].is_null());
        assert_eq!(json["elapsed_seconds"], 0.0);
    }

    #[test]
    fn test_reconcile_huge_remote_elapsed_saturates() {
        let remote = RestTimerWire {
            last_set_timestamp: Some("2024-06-10T18:00:00Z".to_string()),
            last_exercise_category: Some("compound".to_string()),
            elapsed_seconds: Numeric::Value(1e13),
            is_paused: false,
        };
        let now = t0() + secs(60);

        let mut timer = RestTimer::new();
        timer.reconcile(&remote, now);
        assert_eq!(timer.elapsed(now), now - DateTime::<Utc>::MIN_UTC);
        assert_eq!(timer.status(now, &RestThresholdTable::default()).zone, RestZone::Overdue);

        let mut paused = RestTimer::new();
        paused.reconcile(&RestTimerWire { is_paused: true, ..remote }, now);
        // Resuming earlier than the remote snapshot pins the anchor to the calendar start
        let earlier = now - secs(3600);
        paused.resume(earlier);
        assert_eq!(paused.elapsed(earlier), earlier - DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_start_with_elapsed() {
        let mut timer = RestTimer::new();
        timer.start_with_elapsed(t0(), Numeric::Value(95.5), ExerciseCategory::Isolation);
        assert_eq!(timer.elapsed_seconds(t0()), 95.5);
        assert_eq!(timer.last_set_timestamp(), Some(t0() - Duration::milliseconds(95_500)));

        timer.start_with_elapsed(t0(), Numeric::Value(-4.0), ExerciseCategory::Compound);
        assert_eq!(timer.elapsed_seconds(t0()), 0.0);

        timer.start_with_elapsed(t0(), Numeric::Value(f64::MAX), ExerciseCategory::Compound);
        assert_eq!(timer.last_set_timestamp(), Some(DateTime::<Utc>::MIN_UTC));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_pause_resume_same_instant_preserves_elapsed(
            run_ms in 0i64..10_000_000,
        ) {
            let mut timer = RestTimer::new();
            timer.start(t0(), ExerciseCategory::Compound);
            let now = t0() + Duration::milliseconds(run_ms);

            let before = timer.elapsed(now);
            timer.pause(now);
            timer.resume(now);
            prop_assert_eq!(timer.elapsed(now), before);
        }

        #[test]
        fn test_paused_elapsed_never_increases(
            run_ms in 0i64..1_000_000,
            waits in proptest::collection::vec(0i64..10_000_000, 1..10),
        ) {
            let mut timer = RestTimer::new();
            timer.start(t0(), ExerciseCategory::Isolation);
            let paused_at = t0() + Duration::milliseconds(run_ms);
            timer.pause(paused_at);
            let frozen = timer.elapsed(paused_at);

            for wait in waits {
                prop_assert_eq!(timer.elapsed(paused_at + Duration::milliseconds(wait)), frozen);
            }
        }
    }
}
