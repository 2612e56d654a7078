//! Task plan data types.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A single scheduled task in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Short task name.
    pub task_name: String,
    /// Start time, 24-hour `HH:MM`.
    pub start_time: String,
    /// End time, 24-hour `HH:MM`.
    pub end_time: String,
    /// Icon for the task (usually a single emoji).
    #[serde(default)]
    pub icon: String,
    /// Longer description shown when the task is expanded.
    #[serde(default)]
    pub details: String,
}

impl Task {
    /// Create a task with empty icon and details.
    #[must_use]
    pub fn new(
        task_name: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            icon: String::new(),
            details: String::new(),
        }
    }

    /// Set the icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Set the details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Display string for the time span, e.g. `09:00 - 10:30`.
    #[must_use]
    pub fn time_range(&self) -> String {
        format!("{} - {}", self.start_time, self.end_time)
    }

    /// Whether there is anything to show when expanded.
    #[must_use]
    pub fn has_details(&self) -> bool {
        !self.details.trim().is_empty()
    }
}

/// The ordered list of tasks returned by the model.
pub type Planner = Vec<Task>;

const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// Normalize a model-provided time to zero-padded 24-hour `HH:MM`.
///
/// Returns `None` when the input is not a recognizable time of day.
#[must_use]
pub fn normalize_time(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // chrono wants uppercase meridiem and no dots ("a.m.")
    let cleaned = trimmed.replace('.', "").to_uppercase();

    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&cleaned, fmt).ok())
        .map(|t| t.format("%H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_keys() {
        let task = Task::new("Run", "07:00", "07:30").with_icon("🏃");
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["taskName"], "Run");
        assert_eq!(json["startTime"], "07:00");
        assert_eq!(json["endTime"], "07:30");
        assert_eq!(json["icon"], "🏃");
        assert_eq!(json["details"], "");
    }

    #[test]
    fn missing_icon_and_details_default_to_empty() {
        let task: Task =
            serde_json::from_str(r#"{"taskName":"Read","startTime":"20:00","endTime":"21:00"}"#)
                .unwrap();
        assert!(task.icon.is_empty());
        assert!(!task.has_details());
    }

    #[test]
    fn time_range_joins_start_and_end() {
        let task = Task::new("Lunch", "12:00", "13:00");
        assert_eq!(task.time_range(), "12:00 - 13:00");
    }

    #[test]
    fn whitespace_details_do_not_count() {
        let task = Task::new("Nap", "14:00", "14:20").with_details("   ");
        assert!(!task.has_details());
    }

    #[test]
    fn normalizes_24_hour_times() {
        assert_eq!(normalize_time("9:05").as_deref(), Some("09:05"));
        assert_eq!(normalize_time("17:30").as_deref(), Some("17:30"));
        assert_eq!(normalize_time("08:15:00").as_deref(), Some("08:15"));
    }

    #[test]
    fn normalizes_12_hour_times() {
        assert_eq!(normalize_time("9:00 AM").as_deref(), Some("09:00"));
        assert_eq!(normalize_time("1:45 pm").as_deref(), Some("13:45"));
        assert_eq!(normalize_time("12:00PM").as_deref(), Some("12:00"));
        assert_eq!(normalize_time("12:30 a.m.").as_deref(), Some("00:30"));
    }

    #[test]
    fn rejects_non_times() {
        assert_eq!(normalize_time(""), None);
        assert_eq!(normalize_time("morning"), None);
        assert_eq!(normalize_time("25:00"), None);
        assert_eq!(normalize_time("3 PM"), None);
    }
}
