//! Time-decaying recovery estimates
//!
//! Each fatigue source (a muscle group or the CNS) records when fatigue was
//! incurred and how many hours it takes to recover from it. Recovery is
//! modelled as linear progress through that window:
//!
//! - **Elapsed hours**: `now - source_timestamp`, clamped at zero so a
//!   timestamp in the future (clock skew) reads as "just happened"
//! - **Recovery percentage**: `elapsed / recovery_hours * 100`, saturating at
//!   100. A zero-hour window is recovered immediately.
//! - **Hours until recovery**: `recovery_hours - elapsed`, never negative
//!
//! Sources with no timestamp have nothing to recover from and are reported as
//! fully recovered. Values are kept at full precision; rounding belongs to
//! [`crate::display`].

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::FatigueSource;
use crate::numeric::Numeric;

pub const FULLY_RECOVERED: f64 = 100.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Recovery state of one fatigue source at a given instant
///
/// Derived on every read; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoverySnapshot {
    /// `source_timestamp + recovery_hours`, absent when there is no timestamp
    pub recovery_until: Option<DateTime<Utc>>,

    /// Hours since the fatigue was incurred (>= 0)
    pub elapsed_hours: f64,

    /// Hours left until full recovery (>= 0, unrounded)
    pub hours_until_recovery: f64,

    /// Share of the recovery window that has elapsed, 0-100
    pub recovery_percentage: f64,

    /// `recovery_percentage >= 100`
    pub is_recovered: bool,
}

impl RecoverySnapshot {
    /// Snapshot for a source with nothing to recover from
    pub fn fully_recovered() -> Self {
        Self {
            recovery_until: None,
            elapsed_hours: 0.0,
            hours_until_recovery: 0.0,
            recovery_percentage: FULLY_RECOVERED,
            is_recovered: true,
        }
    }

    /// Convert to the boundary representation
    pub fn to_wire(&self) -> RecoverySnapshotWire {
        RecoverySnapshotWire {
            recovery_until: self
                .recovery_until
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            is_recovered: self.is_recovered,
            hours_until_recovery: self.hours_until_recovery,
            recovery_percentage: self.recovery_percentage,
        }
    }
}

/// Recovery snapshot as handed to presentation collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoverySnapshotWire {
    pub recovery_until: Option<String>,
    pub is_recovered: bool,
    pub hours_until_recovery: f64,
    pub recovery_percentage: f64,
}

/// Estimate how far a single source has recovered at `now`
pub fn estimate_recovery(source: &FatigueSource, now: DateTime<Utc>) -> RecoverySnapshot {
    let snapshot = estimate_window(source.source_timestamp, source.recovery_hours, now);
    tracing::trace!(
        source = %source.id,
        elapsed_hours = snapshot.elapsed_hours,
        recovery_percentage = snapshot.recovery_percentage,
        "Estimated recovery"
    );
    snapshot
}

/// Estimate recovery for a raw `(timestamp, hours)` window
///
/// Negative or non-finite `recovery_hours` are treated as zero.
pub fn estimate_window(
    source_timestamp: Option<DateTime<Utc>>,
    recovery_hours: f64,
    now: DateTime<Utc>,
) -> RecoverySnapshot {
    let Some(started) = source_timestamp else {
        return RecoverySnapshot::fully_recovered();
    };

    let recovery_hours = if recovery_hours.is_finite() && recovery_hours > 0.0 {
        recovery_hours
    } else {
        0.0
    };

    let elapsed_hours = elapsed_hours_between(started, now);
    let recovery_percentage = recovery_percentage(elapsed_hours, recovery_hours);

    RecoverySnapshot {
        recovery_until: Some(recovery_deadline(started, recovery_hours)),
        elapsed_hours,
        hours_until_recovery: (recovery_hours - elapsed_hours).max(0.0),
        recovery_percentage,
        is_recovered: recovery_percentage >= FULLY_RECOVERED,
    }
}

/// Linearly decayed fatigue magnitude left at the snapshot's instant
pub fn fatigue_remaining(snapshot: &RecoverySnapshot, magnitude: Numeric) -> Numeric {
    match magnitude {
        Numeric::Value(m) => Numeric::from_f64(m * (1.0 - snapshot.recovery_percentage / 100.0)),
        Numeric::Absent => Numeric::Absent,
    }
}

/// Hours from `start` to `now`, zero if `start` lies in the future
fn elapsed_hours_between(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - start).num_milliseconds();
    if millis < 0 {
        tracing::debug!(skew_ms = -millis, "Source timestamp is in the future, clamping elapsed to 0");
        return 0.0;
    }
    millis as f64 / MILLIS_PER_HOUR
}

fn recovery_percentage(elapsed_hours: f64, recovery_hours: f64) -> f64 {
    if recovery_hours <= 0.0 || elapsed_hours >= recovery_hours {
        return FULLY_RECOVERED;
    }
    // Floating point rounding must not report 100% before the window has elapsed.
    let just_below_full = f64::from_bits(FULLY_RECOVERED.to_bits() - 1);
    (elapsed_hours / recovery_hours * 100.0).clamp(0.0, just_below_full)
}

/// `started + hours`, saturating at the latest representable instant
fn recovery_deadline(started: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
    // `as i64` saturates for windows longer than the duration range
    Duration::try_milliseconds((hours * MILLIS_PER_HOUR).round() as i64)
        .and_then(|window| started.checked_add_signed(window))
        .unwrap_or_else(|| {
            tracing::warn!(recovery_hours = hours, "Recovery window overflows the calendar, saturating");
            DateTime::<Utc>::MAX_UTC
        })
}
