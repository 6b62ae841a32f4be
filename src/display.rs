//! Presentation-boundary formatting
//!
//! The engine keeps full precision; everything here is for humans.

use colored::{ColoredString, Colorize};
use tabled::{settings::Style, Table, Tabled};

use crate::aggregator::RecoveryStatus;
use crate::numeric::ABSENT_PLACEHOLDER;
use crate::recovery::RecoverySnapshot;
use crate::rest_zones::{RestStatus, RestZone};

/// Round half up and clamp to a whole percentage
pub fn round_percentage(percentage: f64) -> u8 {
    if !percentage.is_finite() {
        return 0;
    }
    percentage.round().clamp(0.0, 100.0) as u8
}

/// Whole hours still to wait, rounded up
pub fn hours_until_recovery_ceil(hours: f64) -> u64 {
    if !hours.is_finite() || hours <= 0.0 {
        return 0;
    }
    hours.ceil() as u64
}

/// `m:ss`, or `h:mm:ss` from one hour on
pub fn format_elapsed(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// "Recovered", "5h" or "1d 4h"
pub fn format_hours_remaining(hours: f64) -> String {
    let whole = hours_until_recovery_ceil(hours);
    match whole {
        0 => "Recovered".to_string(),
        h if h < 24 => format!("{}h", h),
        h if h % 24 == 0 => format!("{}d", h / 24),
        h => format!("{}d {}h", h / 24, h % 24),
    }
}

/// Zone text coloured for a terminal
pub fn colored_zone(zone: RestZone) -> ColoredString {
    let text = zone.text();
    match zone {
        RestZone::Early => text.blue(),
        RestZone::Approaching => text.yellow(),
        RestZone::Ready => text.green().bold(),
        RestZone::Overdue => text.red().bold(),
    }
}

#[derive(Tabled)]
struct RecoveryRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Recovery")]
    percentage: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Recovered at")]
    until: String,
}

impl RecoveryRow {
    fn new(source: &str, snapshot: &RecoverySnapshot) -> Self {
        Self {
            source: source.to_string(),
            percentage: format!("{}%", round_percentage(snapshot.recovery_percentage)),
            remaining: format_hours_remaining(snapshot.hours_until_recovery),
            until: snapshot
                .recovery_until
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| ABSENT_PLACEHOLDER.to_string()),
        }
    }
}

/// Render the aggregate as a table, CNS last
pub fn recovery_table(status: &RecoveryStatus) -> String {
    let mut rows: Vec<RecoveryRow> = status
        .per_muscle
        .iter()
        .map(|(name, snapshot)| RecoveryRow::new(name, snapshot))
        .collect();
    if let Some(cns) = &status.cns {
        rows.push(RecoveryRow::new("CNS", cns));
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

/// One-line rest summary, e.g. `1:35 / 3:00  Almost ready`
pub fn rest_line(elapsed_seconds: f64, status: &RestStatus) -> String {
    format!(
        "{} / {}  {}",
        format_elapsed(elapsed_seconds),
        format_elapsed(status.goal),
        colored_zone(status.zone)
    )
}
