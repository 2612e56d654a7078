//! Loading/result state for plan views.
//!
//! Front ends never mutate [`PlannerState`] directly; they dispatch an
//! [`Action`] and render whatever comes out of [`reduce`].

use super::task::{Planner, Task};

/// One row of the rendered planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    /// The task itself.
    pub task: Task,
    /// Whether details are shown.
    pub expanded: bool,
    /// Whether the task has been checked off.
    pub done: bool,
}

impl PlanEntry {
    fn new(task: Task) -> Self {
        Self {
            task,
            expanded: false,
            done: false,
        }
    }
}

/// State driving a plan view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannerState {
    /// A request is in flight.
    pub is_loading: bool,
    /// Rows of the current plan.
    pub entries: Vec<PlanEntry>,
    /// Last failure, cleared by the next request.
    pub error: Option<String>,
    /// Prompt that produced (or is producing) the plan.
    pub prompt: Option<String>,
}

/// State transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A request was sent.
    Loading { prompt: String },
    /// The model answered.
    Loaded(Planner),
    /// The request failed.
    Failed(String),
    /// Show or hide a task's details.
    ToggleExpanded(usize),
    /// Check or uncheck a task.
    ToggleDone(usize),
    /// Show a previously saved plan.
    Restore {
        prompt: String,
        tasks: Planner,
        completed: Vec<usize>,
    },
    /// Reset to the empty state.
    Clear,
}

/// Apply an action to a state.
#[must_use]
pub fn reduce(mut state: PlannerState, action: Action) -> PlannerState {
    match action {
        Action::Loading { prompt } => {
            state.is_loading = true;
            state.error = None;
            state.prompt = Some(prompt);
        }
        Action::Loaded(tasks) => {
            state.is_loading = false;
            state.error = None;
            state.entries = tasks.into_iter().map(PlanEntry::new).collect();
        }
        Action::Failed(message) => {
            state.is_loading = false;
            state.error = Some(message);
        }
        Action::ToggleExpanded(index) => {
            if let Some(entry) = state.entries.get_mut(index) {
                entry.expanded = !entry.expanded;
            }
        }
        Action::ToggleDone(index) => {
            if let Some(entry) = state.entries.get_mut(index) {
                entry.done = !entry.done;
            }
        }
        Action::Restore {
            prompt,
            tasks,
            completed,
        } => {
            state.is_loading = false;
            state.error = None;
            state.prompt = Some(prompt);
            state.entries = tasks
                .into_iter()
                .enumerate()
                .map(|(i, task)| PlanEntry {
                    done: completed.contains(&i),
                    ..PlanEntry::new(task)
                })
                .collect();
        }
        Action::Clear => state = PlannerState::default(),
    }
    state
}

impl PlannerState {
    /// Apply an action in place.
    pub fn dispatch(&mut self, action: Action) {
        *self = reduce(std::mem::take(self), action);
    }

    /// The tasks of the current plan, in order.
    #[must_use]
    pub fn tasks(&self) -> Planner {
        self.entries.iter().map(|e| e.task.clone()).collect()
    }

    /// Indices of checked-off tasks.
    #[must_use]
    pub fn completed_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.done)
            .map(|(i, _)| i)
            .collect()
    }

    /// `(done, total)` task counts.
    #[must_use]
    pub fn progress(&self) -> (usize, usize) {
        let done = self.entries.iter().filter(|e| e.done).count();
        (done, self.entries.len())
    }

    /// Whether there is a plan to show.
    #[must_use]
    pub fn has_plan(&self) -> bool {
        !self.entries.is_empty()
    }
}
