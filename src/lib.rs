//! RecoveryRS: muscle recovery estimates and rest timing between sets
//!
//! The binary and integration tests both go through this crate root.

pub mod aggregator;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod numeric;
pub mod recovery;
pub mod rest_timer;
pub mod rest_zones;
pub mod session;

// Re-export commonly used types for convenience
pub use aggregator::{aggregate, RecoveryInput, RecoveryStatus};
pub use config::AppConfig;
pub use error::{RecoveryRsError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::{ExerciseCategory, FatigueSource, FatigueSourceId, FatigueSourceWire};
pub use numeric::Numeric;
pub use recovery::{estimate_recovery, RecoverySnapshot};
pub use rest_timer::{RestTimer, RestTimerWire, TimerPhase};
pub use rest_zones::{classify, RestStatus, RestThresholdTable, RestThresholds, RestZone};
pub use session::{SessionView, WorkoutSession};
