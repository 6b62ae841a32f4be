//! Recovery status across all fatigue sources
//!
//! Combines per-muscle estimates with the optional CNS slot and parses the
//! JSON payload those sources arrive in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IngestionError, Result};
use crate::models::{FatigueSource, FatigueSourceWire};
use crate::recovery::{estimate_recovery, RecoverySnapshot, RecoverySnapshotWire};

/// Recovery of every tracked muscle group plus the optional CNS slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryStatus {
    pub per_muscle: BTreeMap<String, RecoverySnapshot>,

    /// `None` when CNS tracking is not available to the caller
    pub cns: Option<RecoverySnapshot>,
}

impl RecoveryStatus {
    /// True when every muscle group and the CNS (if tracked) are recovered
    pub fn fully_recovered(&self) -> bool {
        self.per_muscle.values().all(|s| s.is_recovered)
            && self.cns.as_ref().map_or(true, |s| s.is_recovered)
    }

    /// Earliest instant at which a still-recovering source finishes
    pub fn next_recovered_at(&self) -> Option<DateTime<Utc>> {
        self.snapshots()
            .filter(|(_, s)| !s.is_recovered)
            .filter_map(|(_, s)| s.recovery_until)
            .min()
    }

    /// Muscle group with the lowest recovery percentage
    pub fn most_fatigued(&self) -> Option<(&str, &RecoverySnapshot)> {
        self.per_muscle
            .iter()
            .min_by(|a, b| a.1.recovery_percentage.total_cmp(&b.1.recovery_percentage))
            .map(|(name, s)| (name.as_str(), s))
    }

    pub fn to_wire(&self) -> RecoveryStatusWire {
        RecoveryStatusWire {
            per_muscle: self
                .per_muscle
                .iter()
                .map(|(name, s)| (name.clone(), s.to_wire()))
                .collect(),
            cns: self.cns.as_ref().map(RecoverySnapshot::to_wire),
        }
    }

    fn snapshots(&self) -> impl Iterator<Item = (&str, &RecoverySnapshot)> {
        self.per_muscle
            .iter()
            .map(|(name, s)| (name.as_str(), s))
            .chain(self.cns.iter().map(|s| ("CNS", s)))
    }
}

/// Aggregate as handed to presentation collaborators; `cns` is omitted when absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryStatusWire {
    pub per_muscle: BTreeMap<String, RecoverySnapshotWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cns: Option<RecoverySnapshotWire>,
}

/// Estimate recovery for all muscle groups and the CNS at `now`
///
/// Muscle group names are expected to be unique; if one repeats, the later
/// entry wins. CNS-typed entries in `muscles` are ignored.
pub fn aggregate(
    muscles: &[FatigueSource],
    cns: Option<&FatigueSource>,
    now: DateTime<Utc>,
) -> RecoveryStatus {
    let mut per_muscle = BTreeMap::new();

    for source in muscles {
        let Some(name) = source.muscle_group() else {
            tracing::warn!("CNS source passed as a muscle group, ignoring");
            continue;
        };
        if per_muscle
            .insert(name.to_string(), estimate_recovery(source, now))
            .is_some()
        {
            tracing::warn!(muscle_group = name, "Duplicate muscle group, later entry wins");
        }
    }

    let status = RecoveryStatus {
        per_muscle,
        cns: cns.map(|source| estimate_recovery(source, now)),
    };

    tracing::debug!(
        muscles = status.per_muscle.len(),
        cns_tracked = status.cns.is_some(),
        fully_recovered = status.fully_recovered(),
        "Aggregated recovery status"
    );
    status
}

/// Recovery payload as received from an external collaborator
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecoveryInput {
    #[serde(default)]
    pub muscles: Vec<FatigueSourceWire>,

    #[serde(default)]
    pub cns: Option<FatigueSourceWire>,
}

impl RecoveryInput {
    /// Parse a JSON payload
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Normalise every entry
    pub fn into_sources(
        self,
    ) -> std::result::Result<(Vec<FatigueSource>, Option<FatigueSource>), IngestionError> {
        let muscles = self
            .muscles
            .into_iter()
            .map(FatigueSourceWire::into_muscle)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((muscles, self.cns.map(FatigueSourceWire::into_cns)))
    }
}
