//! `last` and `history` commands.

use std::io::Write;

use crate::core::export::{self, ExportFormat};
use crate::core::storage::PlanStore;

use super::HistoryCommands;

/// Print the last saved plan.
pub fn show_last(
    store: &PlanStore,
    format: ExportFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let Some(record) = store.last()? else {
        anyhow::bail!("no saved plan yet; run `taskplan plan \"...\"` first");
    };

    write!(out, "{}", export::render(&record, format)?)?;
    if format == ExportFormat::Json {
        writeln!(out)?;
    }
    Ok(())
}

pub fn handle_history_command(
    store: &PlanStore,
    command: HistoryCommands,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        HistoryCommands::List { limit, format } => {
            let records = store.list(limit)?;

            if format == "json" {
                writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
            } else if records.is_empty() {
                writeln!(out, "No saved plans")?;
            } else {
                writeln!(out, "{:<26} {:<16} {:>5}  Prompt", "ID", "Created", "Tasks")?;
                writeln!(out, "{}", "-".repeat(80))?;
                for record in records {
                    let prompt: String = record.prompt.chars().take(28).collect();
                    writeln!(
                        out,
                        "{:<26} {:<16} {:>5}  {}",
                        record.id,
                        record.created_display(),
                        record.tasks.len(),
                        prompt
                    )?;
                }
            }
        }

        HistoryCommands::Show { id, format, output } => {
            let record = store.get(&id)?;
            let content = export::render(&record, format)?;

            if let Some(path) = output {
                std::fs::write(&path, &content)?;
                writeln!(out, "Exported plan to {path}")?;
            } else {
                write!(out, "{content}")?;
                if format == ExportFormat::Json {
                    writeln!(out)?;
                }
            }
        }

        HistoryCommands::Remove { id } => {
            let record = store.remove(&id)?;
            writeln!(out, "Removed plan {}", record.id)?;
        }
    }

    Ok(())
}
