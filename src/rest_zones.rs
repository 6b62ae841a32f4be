//! Rest zones and the per-category threshold table

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;
use crate::models::ExerciseCategory;

/// Goal and ceiling for one exercise category, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestThresholds {
    /// Rest long enough to start the next set
    pub goal_seconds: f64,

    /// Rest beyond this is considered excessive
    pub max_goal_seconds: f64,
}

impl RestThresholds {
    pub fn new(goal_seconds: f64, max_goal_seconds: f64) -> Self {
        Self {
            goal_seconds,
            max_goal_seconds,
        }
    }

    /// Ensure the row can be classified against
    pub fn validate(&self, category: ExerciseCategory) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidThresholds {
            category: category.to_string(),
            reason: reason.to_string(),
        };
        if !self.goal_seconds.is_finite() || self.goal_seconds <= 0.0 {
            return Err(invalid("goal_seconds must be a positive number"));
        }
        if !self.max_goal_seconds.is_finite() || self.max_goal_seconds < self.goal_seconds {
            return Err(invalid("max_goal_seconds must be >= goal_seconds"));
        }
        Ok(())
    }
}

/// Threshold table keyed by exercise category
///
/// Compound lifts get a longer goal and ceiling than isolation work.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestThresholdTable {
    pub compound: RestThresholds,
    pub isolation: RestThresholds,
}

impl Default for RestThresholdTable {
    fn default() -> Self {
        Self {
            compound: RestThresholds::new(180.0, 300.0),
            isolation: RestThresholds::new(90.0, 180.0),
        }
    }
}

impl RestThresholdTable {
    pub fn for_category(&self, category: ExerciseCategory) -> RestThresholds {
        match category {
            ExerciseCategory::Compound => self.compound,
            ExerciseCategory::Isolation => self.isolation,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compound.validate(ExerciseCategory::Compound)?;
        self.isolation.validate(ExerciseCategory::Isolation)
    }
}

/// Bands of elapsed rest time, in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestZone {
    /// Less than half the goal
    Early,
    /// Between half the goal and the goal
    Approaching,
    /// Goal reached, ceiling not yet
    Ready,
    /// At or past the ceiling
    Overdue,
}

impl RestZone {
    pub fn text(&self) -> &'static str {
        match self {
            RestZone::Early => "Building rest",
            RestZone::Approaching => "Almost ready",
            RestZone::Ready => "Ready for next set",
            RestZone::Overdue => "Rest too long",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RestZone::Early => "#3B82F6",
            RestZone::Approaching => "#F59E0B",
            RestZone::Ready => "#10B981",
            RestZone::Overdue => "#EF4444",
        }
    }
}

impl fmt::Display for RestZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Classify elapsed rest against a goal and ceiling
///
/// - `elapsed < goal / 2` → Early
/// - `goal / 2 <= elapsed < goal` → Approaching
/// - `goal <= elapsed < max_goal` → Ready
/// - `elapsed >= max_goal` → Overdue
///
/// Checked from the top so every input lands in exactly one band; when
/// `max_goal < goal` the ready band is empty.
pub fn classify(elapsed_seconds: f64, goal: f64, max_goal: f64) -> RestZone {
    if elapsed_seconds >= max_goal {
        RestZone::Overdue
    } else if elapsed_seconds >= goal {
        RestZone::Ready
    } else if elapsed_seconds >= goal * 0.5 {
        RestZone::Approaching
    } else {
        RestZone::Early
    }
}

/// Rest status as shown next to the timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestStatus {
    pub zone: RestZone,
    pub text: String,
    pub color: String,
    pub goal: f64,
    pub max_goal: f64,
}

impl RestStatus {
    pub fn new(zone: RestZone, thresholds: RestThresholds) -> Self {
        Self {
            zone,
            text: zone.text().to_string(),
            color: zone.color().to_string(),
            goal: thresholds.goal_seconds,
            max_goal: thresholds.max_goal_seconds,
        }
    }

    /// Classify `elapsed_seconds` for a category
    pub fn evaluate(
        elapsed_seconds: f64,
        category: ExerciseCategory,
        table: &RestThresholdTable,
    ) -> Self {
        let thresholds = table.for_category(category);
        let zone = classify(
            elapsed_seconds,
            thresholds.goal_seconds,
            thresholds.max_goal_seconds,
        );
        Self::new(zone, thresholds)
    }
}
