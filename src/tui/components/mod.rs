//! TUI components for rendering different views.

mod prompt;
mod task_list;

use ratatui::style::Color;

/// Brand colors.
pub const BRAND_TEAL: Color = Color::Rgb(77, 201, 176);
pub const DIMMED: Color = Color::Rgb(100, 100, 110);
pub const SELECTED_BG: Color = Color::Rgb(45, 48, 55);
pub const ERROR_RED: Color = Color::Rgb(230, 100, 100);

pub use prompt::{InputBuffer, PLACEHOLDERS, render_prompt};
pub use task_list::render_task_list;
