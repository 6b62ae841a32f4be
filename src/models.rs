//! Fatigue sources and exercise categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IngestionError;
use crate::numeric::{normalize_timestamp, Numeric};

/// Exercise categories; each selects a row of the rest threshold table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseCategory {
    /// Multi-joint lifts (squat, bench, deadlift)
    Compound,
    /// Single-joint accessory work
    Isolation,
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseCategory::Compound => write!(f, "compound"),
            ExerciseCategory::Isolation => write!(f, "isolation"),
        }
    }
}

impl FromStr for ExerciseCategory {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compound" => Ok(ExerciseCategory::Compound),
            "isolation" => Ok(ExerciseCategory::Isolation),
            _ => Err(IngestionError::UnknownCategory {
                value: s.to_string(),
            }),
        }
    }
}

/// What a fatigue source tracks
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FatigueSourceId {
    /// A named muscle group ("chest", "quads", ...)
    Muscle(String),
    /// Whole-body central nervous system load
    Cns,
}

impl fmt::Display for FatigueSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatigueSourceId::Muscle(name) => write!(f, "{}", name),
            FatigueSourceId::Cns => write!(f, "CNS"),
        }
    }
}

/// A recorded fatigue magnitude and the time it takes to recover from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueSource {
    pub id: FatigueSourceId,

    /// Fatigue score (muscle) or CNS load; opaque to the engine
    pub fatigue_or_load: Numeric,

    /// Number of sets that produced the fatigue (muscles only)
    pub total_sets: Option<u32>,

    /// Hours prescribed for full recovery, never negative
    pub recovery_hours: f64,

    /// When the fatigue was incurred; `None` means nothing to recover from
    pub source_timestamp: Option<DateTime<Utc>>,

    /// Workout that produced the fatigue (reference only)
    pub source_workout_id: Option<String>,
}

impl FatigueSource {
    /// Create a muscle group source
    pub fn muscle(
        name: impl Into<String>,
        fatigue_score: impl Into<Numeric>,
        recovery_hours: f64,
        source_timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        Self::new(
            FatigueSourceId::Muscle(name.into()),
            fatigue_score.into(),
            recovery_hours,
            source_timestamp,
        )
    }

    /// Create the CNS source
    pub fn cns(
        load: impl Into<Numeric>,
        recovery_hours: f64,
        source_timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        Self::new(FatigueSourceId::Cns, load.into(), recovery_hours, source_timestamp)
    }

    fn new(
        id: FatigueSourceId,
        fatigue_or_load: Numeric,
        recovery_hours: f64,
        source_timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            fatigue_or_load,
            total_sets: None,
            recovery_hours: sanitize_recovery_hours(Numeric::from_f64(recovery_hours)),
            source_timestamp,
            source_workout_id: None,
        }
    }

    pub fn with_total_sets(mut self, total_sets: u32) -> Self {
        self.total_sets = Some(total_sets);
        self
    }

    pub fn with_workout_id(mut self, workout_id: impl Into<String>) -> Self {
        self.source_workout_id = Some(workout_id.into());
        self
    }

    /// Muscle group name, or `None` for the CNS source
    pub fn muscle_group(&self) -> Option<&str> {
        match &self.id {
            FatigueSourceId::Muscle(name) => Some(name),
            FatigueSourceId::Cns => None,
        }
    }
}

/// Recovery hours that are absent or negative are treated as zero
fn sanitize_recovery_hours(hours: Numeric) -> f64 {
    match hours {
        Numeric::Value(h) if h >= 0.0 => h,
        Numeric::Value(h) => {
            tracing::warn!(recovery_hours = h, "Negative recovery hours clamped to 0");
            0.0
        }
        Numeric::Absent => 0.0,
    }
}

/// Fatigue source exactly as an external collaborator sends it
///
/// Muscle entries carry `muscle_group` and `fatigue_score`; the CNS entry
/// carries `cns_load`. Every numeric field may arrive as a string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FatigueSourceWire {
    #[serde(default)]
    pub muscle_group: Option<String>,

    #[serde(default, alias = "fatigue_score", alias = "cns_load")]
    pub fatigue_score_or_cns_load: Numeric,

    #[serde(default)]
    pub total_sets: Numeric,

    #[serde(default)]
    pub recovery_hours: Numeric,

    #[serde(default)]
    pub source_timestamp: Option<String>,

    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub source_workout_id: Option<String>,
}

impl FatigueSourceWire {
    /// Normalise into a muscle source; fails without a muscle group name
    pub fn into_muscle(self) -> Result<FatigueSource, IngestionError> {
        let name = self
            .muscle_group
            .clone()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| IngestionError::MissingField {
                field: "muscle_group".to_string(),
            })?;
        Ok(self.into_source(FatigueSourceId::Muscle(name)))
    }

    /// Normalise into the CNS source
    pub fn into_cns(self) -> FatigueSource {
        self.into_source(FatigueSourceId::Cns)
    }

    fn into_source(self, id: FatigueSourceId) -> FatigueSource {
        let total_sets = match (&id, self.total_sets.value()) {
            (FatigueSourceId::Muscle(_), Some(n)) if n >= 0.0 => Some(n.round() as u32),
            _ => None,
        };
        FatigueSource {
            id,
            fatigue_or_load: self.fatigue_score_or_cns_load,
            total_sets,
            recovery_hours: sanitize_recovery_hours(self.recovery_hours),
            source_timestamp: normalize_timestamp(self.source_timestamp.as_deref()),
            source_workout_id: self.source_workout_id,
        }
    }
}

/// Workout ids arrive as numbers or strings
fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
