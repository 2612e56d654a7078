//! Core planning logic shared across CLI, TUI, and API.

pub mod cache;
mod error;
pub mod export;
pub mod gemini;
pub mod keychain;
pub mod provider;
pub mod reducer;
pub mod retry;
pub mod schema;
pub mod service;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
pub use gemini::GeminiClient;
pub use provider::PlanGenerator;
pub use service::{PlanOutcome, PlanService, validate_prompt};
pub use task::{Planner, Task};
