//! Plain-text, Markdown and JSON renderings of plans.

use std::fmt::Write as _;
use std::str::FromStr;

use super::storage::PlanRecord;
use super::task::Task;

/// Output format for printed or exported plans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Aligned terminal listing.
    #[default]
    Text,
    /// Pretty JSON.
    Json,
    /// GitHub-flavored task list.
    Markdown,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!(
                "unknown format '{other}' (expected text, json or markdown)"
            )),
        }
    }
}

/// Render a record in the given format.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn render(record: &PlanRecord, format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Text => Ok(render_text(&record.tasks, &record.completed)),
        ExportFormat::Json => render_json(record),
        ExportFormat::Markdown => Ok(render_markdown(record)),
    }
}

/// Terminal listing, one line per task with indented details.
#[must_use]
pub fn render_text(tasks: &[Task], completed: &[usize]) -> String {
    if tasks.is_empty() {
        return "No tasks in this plan.\n".to_string();
    }

    let mut out = String::new();
    for (i, task) in tasks.iter().enumerate() {
        let check = if completed.contains(&i) { "[x]" } else { "[ ]" };
        let icon = if task.icon.is_empty() { "•" } else { task.icon.as_str() };
        let _ = writeln!(
            out,
            "{check} {}  {icon}  {}",
            task.time_range(),
            task.task_name
        );
        if task.has_details() {
            for line in task.details.lines() {
                let _ = writeln!(out, "      {}", line.trim());
            }
        }
    }
    out
}

/// Markdown document with a heading, metadata and a task list.
#[must_use]
pub fn render_markdown(record: &PlanRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", record.prompt.trim());
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "_Generated {} by {} · {} tasks_",
        record.created_display(),
        record.model,
        record.tasks.len()
    );
    let _ = writeln!(out);

    for (i, task) in record.tasks.iter().enumerate() {
        let check = if record.completed.contains(&i) { "x" } else { " " };
        let icon = if task.icon.is_empty() {
            String::new()
        } else {
            format!("{} ", task.icon)
        };
        let _ = writeln!(
            out,
            "- [{check}] **{}** {icon}{}",
            task.time_range(),
            task.task_name
        );
        if task.has_details() {
            for line in task.details.lines() {
                let _ = writeln!(out, "  {}", line.trim());
            }
        }
    }
    out
}

/// Pretty JSON of the whole record.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(record: &PlanRecord) -> serde_json::Result<String> {
    serde_json::to_string_pretty(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PlanRecord {
        let mut r = PlanRecord::new(
            "Plan my Saturday",
            "gemini-2.5-flash",
            vec![
                Task::new("Farmers market", "09:00", "10:30")
                    .with_icon("🥕")
                    .with_details("Buy vegetables.\nBring bags."),
                Task::new("Laundry", "11:00", "12:00"),
            ],
        );
        r.completed = vec![1];
        r
    }

    #[test]
    fn parses_formats() {
        assert_eq!("text".parse::<ExportFormat>(), Ok(ExportFormat::Text));
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("md".parse::<ExportFormat>(), Ok(ExportFormat::Markdown));
        assert!("yaml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn text_lists_tasks_with_checkboxes_and_details() {
        let r = record();
        let text = render_text(&r.tasks, &r.completed);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "[ ] 09:00 - 10:30  🥕  Farmers market");
        assert_eq!(lines[1], "      Buy vegetables.");
        assert_eq!(lines[2], "      Bring bags.");
        assert_eq!(lines[3], "[x] 11:00 - 12:00  •  Laundry");
    }

    #[test]
    fn text_for_empty_plan() {
        assert_eq!(render_text(&[], &[]), "No tasks in this plan.\n");
    }

    #[test]
    fn markdown_has_heading_and_task_list() {
        let md = render_markdown(&record());
        assert!(md.starts_with("# Plan my Saturday\n"));
        assert!(md.contains("gemini-2.5-flash · 2 tasks"));
        assert!(md.contains("- [ ] **09:00 - 10:30** 🥕 Farmers market\n  Buy vegetables.\n  Bring bags.\n"));
        assert!(md.contains("- [x] **11:00 - 12:00** Laundry\n"));
    }

    #[test]
    fn json_round_trips_the_record() {
        let r = record();
        let json = render(&r, ExportFormat::Json).unwrap();
        let back: PlanRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
