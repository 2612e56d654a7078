//! Plan generation pipeline shared by the CLI, TUI and HTTP API.

use std::sync::Arc;

use serde::Serialize;

use super::cache::PlanCache;
use super::provider::PlanGenerator;
use super::retry::{RetryPolicy, retry};
use super::task::{Planner, Task};
use super::{Error, Result};
use crate::config::PlannerConfig;

/// Longest prompt accepted, in characters.
pub const MAX_PROMPT_CHARS: usize = 4000;

/// Trim a prompt and reject empty or oversized ones.
pub fn validate_prompt(prompt: &str) -> Result<String> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyPrompt);
    }

    let len = trimmed.chars().count();
    if len > MAX_PROMPT_CHARS {
        return Err(Error::PromptTooLong {
            len,
            max: MAX_PROMPT_CHARS,
        });
    }

    Ok(trimmed.to_string())
}

/// Result of a generation request.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PlanOutcome {
    /// The validated plan.
    #[schema(value_type = Vec<Task>)]
    pub tasks: Planner,
    /// Whether the plan came from the prompt cache.
    pub cached: bool,
    /// Model that produced the plan.
    pub model: String,
}

/// Validates prompts, consults the cache, and calls the generator with retries.
pub struct PlanService {
    generator: Arc<dyn PlanGenerator>,
    retry: RetryPolicy,
    cache: Option<PlanCache>,
}

impl std::fmt::Debug for PlanService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanService")
            .field("generator", &self.generator.name())
            .field("model", &self.generator.model())
            .field("retry", &self.retry)
            .field("cache", &self.cache)
            .finish()
    }
}

impl PlanService {
    /// Create a service with no cache and the default retry policy.
    #[must_use]
    pub fn new(generator: Arc<dyn PlanGenerator>) -> Self {
        Self {
            generator,
            retry: RetryPolicy::default(),
            cache: None,
        }
    }

    /// Create a service configured from the `[planner]` section.
    #[must_use]
    pub fn from_config(generator: Arc<dyn PlanGenerator>, config: &PlannerConfig) -> Self {
        Self {
            generator,
            retry: config.retry_policy(),
            cache: config.build_cache(),
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Attach a prompt cache.
    #[must_use]
    pub fn with_cache(mut self, cache: PlanCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Model used by the underlying generator.
    #[must_use]
    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Generate a plan, serving repeated prompts from the cache.
    pub async fn generate(&self, prompt: &str) -> Result<PlanOutcome> {
        let prompt = validate_prompt(prompt)?;

        if let Some(tasks) = self
            .cache
            .as_ref()
            .and_then(|c| c.get(self.model(), &prompt))
        {
            tracing::debug!(tasks = tasks.len(), "plan served from cache");
            return Ok(PlanOutcome {
                tasks,
                cached: true,
                model: self.model().to_string(),
            });
        }

        self.call_generator(prompt).await
    }

    /// Generate a plan without consulting the cache (the result is still cached).
    pub async fn generate_uncached(&self, prompt: &str) -> Result<PlanOutcome> {
        let prompt = validate_prompt(prompt)?;
        self.call_generator(prompt).await
    }

    async fn call_generator(&self, prompt: String) -> Result<PlanOutcome> {
        tracing::info!(
            provider = self.generator.name(),
            model = %self.model(),
            prompt_chars = prompt.chars().count(),
            "generating plan"
        );

        let generator = &self.generator;
        let prompt_ref = prompt.as_str();
        let tasks = retry(&self.retry, || async move { generator.generate(prompt_ref).await })
            .await
            .inspect_err(|e| tracing::error!(error = %e, "plan generation failed"))?;

        tracing::info!(tasks = tasks.len(), "plan generated");

        if let Some(cache) = &self.cache {
            cache.insert(self.model(), &prompt, tasks.clone());
        }

        Ok(PlanOutcome {
            tasks,
            cached: false,
            model: self.model().to_string(),
        })
    }
}
