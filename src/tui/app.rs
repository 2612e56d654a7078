//! TUI application state.

use std::sync::Arc;

use rand::prelude::IndexedRandom;
use tokio::sync::mpsc;

use super::components::{InputBuffer, PLACEHOLDERS};
use super::state::Focus;
use crate::config::Config;
use crate::core::reducer::{Action, PlannerState};
use crate::core::storage::{PlanRecord, PlanStore};
use crate::core::{PlanOutcome, PlanService, validate_prompt};

/// Braille spinner frames shown while a request is in flight.
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const NO_KEY_MESSAGE: &str =
    "No Gemini API key configured: set GEMINI_API_KEY or run `taskplan auth login`";

/// Message from a generation task.
#[derive(Debug)]
pub enum PlanMessage {
    /// The model answered.
    Done { prompt: String, outcome: PlanOutcome },
    /// Generation failed.
    Failed(String),
}

/// Application state for the TUI.
pub struct App {
    /// Plan loading/result state.
    pub planner: PlannerState,

    /// Prompt input.
    pub input: InputBuffer,

    /// Pane receiving key input.
    pub focus: Focus,

    /// Selected row in the task list.
    pub selected: usize,

    /// Informational status line (errors come from the planner state).
    pub notice: Option<String>,

    /// Placeholder shown in the empty prompt.
    pub placeholder: &'static str,

    /// Model name for display.
    pub model: String,

    /// Spinner frame counter.
    pub tick: usize,

    /// Enable mouse capture.
    pub mouse: bool,

    /// Receiver for generation results.
    pub plan_rx: mpsc::UnboundedReceiver<PlanMessage>,

    plan_tx: mpsc::UnboundedSender<PlanMessage>,
    service: Option<Arc<PlanService>>,
    store: Option<PlanStore>,
    save: bool,

    /// Id of the saved record behind the current plan.
    record_id: Option<String>,
}

impl App {
    /// Create application state from configuration, restoring the last plan.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let service = match config.create_service() {
            Ok(service) => Some(Arc::new(service)),
            Err(e) => {
                tracing::warn!(error = %e, "plan generation disabled");
                None
            }
        };

        let store = PlanStore::open_default()
            .inspect_err(|e| tracing::warn!(error = %e, "plan history disabled"))
            .ok();

        let mut app = Self::with_parts(service, store, config.planner.save_last);
        app.model.clone_from(&config.gemini.model);
        app.mouse = config.tui.mouse;
        app.restore_last();
        app
    }

    /// Create application state from explicit parts.
    #[must_use]
    pub fn with_parts(
        service: Option<Arc<PlanService>>,
        store: Option<PlanStore>,
        save: bool,
    ) -> Self {
        let (plan_tx, plan_rx) = mpsc::unbounded_channel();

        let notice = service.is_none().then(|| NO_KEY_MESSAGE.to_string());
        let model = service
            .as_ref()
            .map(|s| s.model().to_string())
            .unwrap_or_default();
        let placeholder = PLACEHOLDERS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or("describe your day...");

        Self {
            planner: PlannerState::default(),
            input: InputBuffer::default(),
            focus: Focus::Input,
            selected: 0,
            notice,
            placeholder,
            model,
            tick: 0,
            mouse: true,
            plan_rx,
            plan_tx,
            service,
            store,
            save,
            record_id: None,
        }
    }

    /// Show the last saved plan, if there is one.
    pub fn restore_last(&mut self) {
        let Some(store) = &self.store else {
            return;
        };

        match store.last() {
            Ok(Some(record)) => {
                if self.notice.is_none() {
                    self.notice = Some(format!("Restored plan from {}", record.created_display()));
                }
                self.record_id = Some(record.id);
                self.planner.dispatch(Action::Restore {
                    prompt: record.prompt,
                    tasks: record.tasks,
                    completed: record.completed,
                });
                self.selected = 0;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to load last plan"),
        }
    }

    /// Submit the current input for generation.
    ///
    /// Ignored while a request is already in flight.
    pub fn submit(&mut self) {
        if self.planner.is_loading {
            return;
        }

        let prompt = match validate_prompt(self.input.text()) {
            Ok(prompt) => prompt,
            Err(e) => {
                self.planner.dispatch(Action::Failed(e.to_string()));
                return;
            }
        };

        let Some(service) = self.service.clone() else {
            self.planner.dispatch(Action::Failed(NO_KEY_MESSAGE.to_string()));
            return;
        };

        self.notice = None;
        self.planner.dispatch(Action::Loading {
            prompt: prompt.clone(),
        });

        let tx = self.plan_tx.clone();
        tokio::spawn(async move {
            let result = service.generate(&prompt).await;
            let message = match result {
                Ok(outcome) => PlanMessage::Done { prompt, outcome },
                Err(e) => PlanMessage::Failed(e.to_string()),
            };
            let _ = tx.send(message);
        });
    }

    /// Apply a generation result.
    pub fn handle_plan_message(&mut self, message: PlanMessage) {
        match message {
            PlanMessage::Done { prompt, outcome } => {
                self.record_id = None;
                if self.save {
                    if let Some(store) = &self.store {
                        let record =
                            PlanRecord::new(prompt, &outcome.model, outcome.tasks.clone());
                        match store.save(&record) {
                            Ok(()) => self.record_id = Some(record.id),
                            Err(e) => {
                                tracing::warn!(error = %e, "failed to save plan");
                                self.notice = Some(format!("Plan not saved: {e}"));
                            }
                        }
                    }
                }

                if self.notice.is_none() {
                    let count = outcome.tasks.len();
                    self.notice = Some(if outcome.cached {
                        format!("{count} tasks (cached)")
                    } else {
                        format!("{count} tasks from {}", outcome.model)
                    });
                }

                let has_tasks = !outcome.tasks.is_empty();
                self.planner.dispatch(Action::Loaded(outcome.tasks));
                self.selected = 0;
                if has_tasks {
                    self.focus = Focus::List;
                }
            }
            PlanMessage::Failed(message) => {
                self.planner.dispatch(Action::Failed(message));
            }
        }
    }

    /// Switch focus between input and list (the list only when it has rows).
    pub fn toggle_focus(&mut self) {
        if self.focus == Focus::Input && !self.planner.has_plan() {
            return;
        }
        self.focus = self.focus.toggled();
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        let len = self.planner.entries.len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn toggle_expanded(&mut self) {
        self.planner.dispatch(Action::ToggleExpanded(self.selected));
    }

    /// Check or uncheck the selected task and persist the completed set.
    pub fn toggle_done(&mut self) {
        if self.selected >= self.planner.entries.len() {
            return;
        }
        self.planner.dispatch(Action::ToggleDone(self.selected));

        if let (Some(store), Some(id)) = (&self.store, &self.record_id) {
            if let Err(e) = store.set_completed(id, &self.planner.completed_indices()) {
                tracing::warn!(error = %e, "failed to persist completed tasks");
                self.notice = Some(format!("Progress not saved: {e}"));
            }
        }
    }

    /// Current spinner frame.
    #[must_use]
    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.tick % SPINNER_FRAMES.len()]
    }

    pub const fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::Storage;
    use crate::core::task::{Planner, Task};
    use crate::core::{Error, PlanGenerator, Result};
    use async_trait::async_trait;

    struct Stub;

    #[async_trait]
    impl PlanGenerator for Stub {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }

        async fn generate(&self, prompt: &str) -> Result<Planner> {
            if prompt == "fail" {
                return Err(Error::Blocked("SAFETY".to_string()));
            }
            Ok(vec![
                Task::new("Coffee", "08:00", "08:15").with_details("Oat milk."),
                Task::new("Email", "08:15", "09:00"),
            ])
        }
    }

    fn app_with_store() -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::new(Storage::with_root(dir.path().to_path_buf()));
        let service = Arc::new(PlanService::new(Arc::new(Stub)));
        (App::with_parts(Some(service), Some(store), true), dir)
    }

    async fn submit_and_wait(app: &mut App, prompt: &str) {
        app.input.set_text(prompt);
        app.submit();
        assert!(app.planner.is_loading);
        let message = app.plan_rx.recv().await.unwrap();
        app.handle_plan_message(message);
    }

    #[tokio::test]
    async fn submit_loads_plan_and_focuses_list() {
        let (mut app, _dir) = app_with_store();
        submit_and_wait(&mut app, "plan my morning").await;

        assert!(!app.planner.is_loading);
        assert_eq!(app.planner.entries.len(), 2);
        assert_eq!(app.focus, Focus::List);
        assert_eq!(app.notice.as_deref(), Some("2 tasks from stub-model"));
    }

    #[tokio::test]
    async fn second_submit_while_loading_is_ignored() {
        let (mut app, _dir) = app_with_store();
        app.input.set_text("first");
        app.submit();
        app.input.set_text("second");
        app.submit();

        assert_eq!(app.planner.prompt.as_deref(), Some("first"));
        let message = app.plan_rx.recv().await.unwrap();
        app.handle_plan_message(message);
        assert!(app.plan_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failure_is_shown_in_state() {
        let (mut app, _dir) = app_with_store();
        submit_and_wait(&mut app, "fail").await;

        assert!(!app.planner.is_loading);
        assert!(app.planner.error.as_deref().unwrap().contains("SAFETY"));
        assert_eq!(app.focus, Focus::Input);
    }

    #[test]
    fn empty_prompt_fails_without_loading() {
        let (mut app, _dir) = app_with_store();
        app.input.set_text("   ");
        app.submit();
        assert!(!app.planner.is_loading);
        assert_eq!(app.planner.error.as_deref(), Some("prompt is empty"));
    }

    #[test]
    fn missing_service_reports_key_problem() {
        let mut app = App::with_parts(None, None, true);
        assert_eq!(app.notice.as_deref(), Some(NO_KEY_MESSAGE));
        app.input.set_text("plan");
        app.submit();
        assert_eq!(app.planner.error.as_deref(), Some(NO_KEY_MESSAGE));
    }

    #[tokio::test]
    async fn completed_tasks_persist_and_restore() {
        let (mut app, dir) = app_with_store();
        submit_and_wait(&mut app, "plan my morning").await;

        app.select_next();
        app.toggle_done();
        assert_eq!(app.planner.completed_indices(), vec![1]);

        let store = PlanStore::new(Storage::with_root(dir.path().to_path_buf()));
        let mut restored = App::with_parts(None, Some(store), true);
        restored.restore_last();
        assert_eq!(restored.planner.prompt.as_deref(), Some("plan my morning"));
        assert_eq!(restored.planner.completed_indices(), vec![1]);
    }

    #[tokio::test]
    async fn selection_is_clamped() {
        let (mut app, _dir) = app_with_store();
        submit_and_wait(&mut app, "plan").await;

        app.select_previous();
        assert_eq!(app.selected, 0);
        app.select_next();
        app.select_next();
        app.select_next();
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn focus_stays_on_input_without_plan() {
        let (mut app, _dir) = app_with_store();
        app.toggle_focus();
        assert_eq!(app.focus, Focus::Input);
    }

    #[test]
    fn spinner_cycles() {
        let (mut app, _dir) = app_with_store();
        let first = app.spinner();
        for _ in 0..SPINNER_FRAMES.len() {
            app.advance_tick();
        }
        assert_eq!(app.spinner(), first);
    }
}
