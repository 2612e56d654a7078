//! Saved plans and the "last plan" slot.

use std::sync::LazyLock;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use ulid::{Generator, Ulid};

use super::{Result, Storage, StorageError};
use crate::core::task::{Planner, Task};

const PLANS: &str = "plans";
const LAST: &str = "last";

// Monotonic within a millisecond, so ids saved back to back still sort by creation
static IDS: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

fn next_id() -> Ulid {
    IDS.lock().generate().unwrap_or_else(|_| Ulid::new())
}

/// Whether `id` could be (a prefix of) a plan id: Crockford base32, no path tricks.
fn is_id_like(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 26
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || (b.is_ascii_uppercase() && !b"ILOU".contains(&b)))
}

/// A generated plan as persisted on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PlanRecord {
    /// ULID, so lexical order is creation order.
    pub id: String,
    /// The request that produced the plan.
    pub prompt: String,
    /// Model that generated it.
    pub model: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: i64,
    /// The tasks.
    #[schema(value_type = Vec<Task>)]
    pub tasks: Planner,
    /// Indices of checked-off tasks.
    #[serde(default)]
    pub completed: Vec<usize>,
}

impl PlanRecord {
    /// Create a record stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(prompt: impl Into<String>, model: impl Into<String>, tasks: Planner) -> Self {
        Self {
            id: next_id().to_string(),
            prompt: prompt.into(),
            model: model.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
            tasks,
            completed: Vec::new(),
        }
    }

    /// Creation time formatted for listings, in local time.
    #[must_use]
    pub fn created_display(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.created_at).map_or_else(
            || "unknown".to_string(),
            |dt| {
                dt.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            },
        )
    }
}

/// Plan history on top of [`Storage`].
#[derive(Debug, Clone)]
pub struct PlanStore {
    storage: Storage,
}

impl PlanStore {
    /// Wrap a storage backend.
    #[must_use]
    pub const fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Open the store at the default data location.
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be determined.
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(Storage::new()?))
    }

    /// Save a plan to history and make it the last plan.
    pub fn save(&self, record: &PlanRecord) -> Result<()> {
        self.storage.write(&[PLANS, record.id.as_str()], record)?;
        self.storage.write(&[LAST], record)?;
        tracing::debug!(id = %record.id, tasks = record.tasks.len(), "saved plan");
        Ok(())
    }

    /// The most recently saved plan, if any.
    pub fn last(&self) -> Result<Option<PlanRecord>> {
        match self.storage.read(&[LAST]) {
            Ok(record) => Ok(Some(record)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Look up a plan by id or unique id prefix (case-insensitive).
    pub fn get(&self, id: &str) -> Result<PlanRecord> {
        let wanted = id.trim().to_uppercase();
        if !is_id_like(&wanted) {
            return Err(StorageError::NotFound(id.to_string()));
        }
        if self.storage.exists(&[PLANS, wanted.as_str()]) {
            return self.storage.read(&[PLANS, wanted.as_str()]);
        }

        let matches: Vec<String> = self
            .storage
            .list(&[PLANS])?
            .into_iter()
            .filter(|k| k.starts_with(&wanted))
            .collect();

        match matches.as_slice() {
            [] => Err(StorageError::NotFound(id.to_string())),
            [only] => self.storage.read(&[PLANS, only.as_str()]),
            _ => Err(StorageError::Ambiguous(id.to_string())),
        }
    }

    /// Saved plans, newest first.
    pub fn list(&self, limit: usize) -> Result<Vec<PlanRecord>> {
        let mut keys = self.storage.list(&[PLANS])?;
        keys.reverse();

        let mut records = Vec::new();
        for key in keys.into_iter().take(limit) {
            match self.storage.read(&[PLANS, key.as_str()]) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(key = %key, error = %e, "skipping unreadable plan"),
            }
        }
        Ok(records)
    }

    /// Record which tasks are checked off.
    ///
    /// Also updates the last-plan slot when it holds the same plan.
    pub fn set_completed(&self, id: &str, completed: &[usize]) -> Result<PlanRecord> {
        if !is_id_like(id) {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let record = self.storage.update(&[PLANS, id], |r: &mut PlanRecord| {
            r.completed = completed.to_vec();
        })?;

        if self.last()?.is_some_and(|last| last.id == record.id) {
            self.storage.write(&[LAST], &record)?;
        }

        Ok(record)
    }

    /// Delete a plan, clearing the last-plan slot if it pointed at it.
    pub fn remove(&self, id: &str) -> Result<PlanRecord> {
        let record = self.get(id)?;
        self.storage.remove(&[PLANS, record.id.as_str()])?;

        if self.last()?.is_some_and(|last| last.id == record.id) {
            self.storage.remove(&[LAST])?;
        }

        Ok(record)
    }
}
