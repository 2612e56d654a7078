//! Plan generator abstraction.

use async_trait::async_trait;

use super::Result;
use super::task::Planner;

/// Something that turns a prompt into a validated planner.
///
/// Implemented by the Gemini client; tests substitute scripted generators.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &'static str;

    /// Model identifier used for requests and cache keys.
    fn model(&self) -> &str;

    /// Generate a plan for an already-validated prompt.
    async fn generate(&self, prompt: &str) -> Result<Planner>;
}
