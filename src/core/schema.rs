//! The task schema sent to the model, and enforcement of it on the way back.
//!
//! Gemini's structured output only guarantees the shape on a best-effort
//! basis, so every response goes through [`parse_planner`] before anything
//! downstream sees it.

use serde_json::{Map, Value, json};

use super::task::{Planner, Task, normalize_time};
use super::{Error, Result};

/// Property names in the order the model should emit them.
pub const PROPERTY_ORDER: &[&str] = &["taskName", "startTime", "endTime", "icon", "details"];

/// Build the response schema in Gemini's OpenAPI-subset dialect.
#[must_use]
pub fn task_schema() -> Value {
    json!({
        "type": "ARRAY",
        "description": "Tasks that make up the plan, in chronological order.",
        "items": {
            "type": "OBJECT",
            "properties": {
                "taskName": {
                    "type": "STRING",
                    "description": "Short name of the task."
                },
                "startTime": {
                    "type": "STRING",
                    "description": "Start time in 24-hour HH:MM format."
                },
                "endTime": {
                    "type": "STRING",
                    "description": "End time in 24-hour HH:MM format."
                },
                "icon": {
                    "type": "STRING",
                    "description": "A single emoji representing the task."
                },
                "details": {
                    "type": "STRING",
                    "description": "One or two sentences describing the task."
                }
            },
            "required": PROPERTY_ORDER,
            "propertyOrdering": PROPERTY_ORDER
        }
    })
}

/// Parse model output into a planner, enforcing the task schema.
///
/// Accepts a top-level array, or an object wrapping the array under `tasks`.
pub fn parse_planner(text: &str) -> Result<Planner> {
    let value: Value =
        serde_json::from_str(strip_code_fence(text)).map_err(|e| Error::Parse(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("tasks") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::Schema(
                    "expected an array of tasks at the top level".to_string(),
                ));
            }
        },
        _ => {
            return Err(Error::Schema(
                "expected an array of tasks at the top level".to_string(),
            ));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(obj) => task_from_object(index, &obj),
            _ => Err(Error::Schema(format!("task {index}: expected an object"))),
        })
        .collect()
}

fn task_from_object(index: usize, obj: &Map<String, Value>) -> Result<Task> {
    let task_name = required_string(index, obj, "taskName")?;
    let start_raw = required_string(index, obj, "startTime")?;
    let end_raw = required_string(index, obj, "endTime")?;

    let start_time = normalize_time(&start_raw).ok_or_else(|| {
        Error::Schema(format!("task {index}: startTime '{start_raw}' is not a time"))
    })?;
    let end_time = normalize_time(&end_raw)
        .ok_or_else(|| Error::Schema(format!("task {index}: endTime '{end_raw}' is not a time")))?;

    Ok(Task {
        task_name,
        start_time,
        end_time,
        icon: optional_string(index, obj, "icon")?,
        details: optional_string(index, obj, "details")?,
    })
}

fn required_string(index: usize, obj: &Map<String, Value>, field: &str) -> Result<String> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(Error::Schema(format!("task {index}: {field} is empty"))),
        Some(_) => Err(Error::Schema(format!(
            "task {index}: {field} must be a string"
        ))),
        None => Err(Error::Schema(format!("task {index}: missing {field}"))),
    }
}

fn optional_string(index: usize, obj: &Map<String, Value>, field: &str) -> Result<String> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        None | Some(Value::Null) => Ok(String::new()),
        Some(_) => Err(Error::Schema(format!(
            "task {index}: {field} must be a string"
        ))),
    }
}

/// Strip a surrounding Markdown code fence, which some models add even in JSON mode.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
