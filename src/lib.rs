//! taskplan - turn a free-text request into a timed task list.
//!
//! The same planning core backs three front ends:
//! - CLI commands for one-shot plans and history
//! - Terminal user interface (TUI)
//! - HTTP API
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  ┌─────────────┐  ┌─────────────┐
//! │     CLI     │  │     TUI     │  │   HTTP API  │
//! └──────┬──────┘  └──────┬──────┘  └──────┬──────┘
//!        │                │                │
//!        └────────────────┼────────────────┘
//!                         │
//!                  ┌──────┴──────┐
//!                  │    Core     │──── Gemini
//!                  └─────────────┘
//! ```

pub mod api;
pub mod build_info;
pub mod cli;
pub mod config;
pub mod core;
pub mod tui;

pub use config::Config;
pub use core::{Error, PlanService, Planner, Task};
