//! Plan view: one row per task, with expandable details.

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use super::{BRAND_TEAL, DIMMED, SELECTED_BG};
use crate::core::reducer::{PlanEntry, PlannerState};

const DONE_GREEN: Color = Color::Rgb(120, 200, 120);

pub const CHEVRON_COLLAPSED: &str = "▸";
pub const CHEVRON_EXPANDED: &str = "▾";

fn checkbox(done: bool) -> &'static str {
    if done { "[x]" } else { "[ ]" }
}

/// Word-wrap `text` to `width` columns (by character count).
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let len = current.chars().count();
            let word_len = word.chars().count();
            if len > 0 && len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Lines making up one task row.
fn row_lines(entry: &PlanEntry, selected: bool, width: usize) -> Vec<Line<'static>> {
    let base = if selected {
        Style::default().bg(SELECTED_BG).fg(Color::White)
    } else {
        Style::default().fg(Color::White)
    };
    let name_style = match (entry.done, selected) {
        (true, _) => base.fg(DIMMED).add_modifier(Modifier::CROSSED_OUT),
        (false, true) => base.add_modifier(Modifier::BOLD),
        (false, false) => base,
    };
    let check_style = if entry.done {
        base.fg(DONE_GREEN)
    } else {
        base.fg(DIMMED)
    };

    let chevron = if !entry.task.has_details() {
        " "
    } else if entry.expanded {
        CHEVRON_EXPANDED
    } else {
        CHEVRON_COLLAPSED
    };
    let icon = if entry.task.icon.is_empty() {
        "•".to_string()
    } else {
        entry.task.icon.clone()
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(format!(" {chevron} "), base.fg(BRAND_TEAL)),
        Span::styled(checkbox(entry.done), check_style),
        Span::styled(format!(" {icon} "), base),
        Span::styled(entry.task.time_range(), base.fg(BRAND_TEAL)),
        Span::styled("  ", base),
        Span::styled(entry.task.task_name.clone(), name_style),
    ])];

    if entry.expanded && entry.task.has_details() {
        let indent = "       ";
        for line in wrap_text(&entry.task.details, width.saturating_sub(indent.len() + 1)) {
            lines.push(Line::from(Span::styled(
                format!("{indent}{line}"),
                Style::default().fg(DIMMED),
            )));
        }
    }

    lines
}

/// Render the plan list.
pub fn render_task_list(
    frame: &mut Frame,
    area: Rect,
    planner: &PlannerState,
    selected: usize,
    focused: bool,
) {
    let border_color = if focused { BRAND_TEAL } else { DIMMED };
    let (done, total) = planner.progress();

    let title = planner.prompt.as_deref().map_or_else(
        || " Plan ".to_string(),
        |p| {
            let short: String = p.chars().take(48).collect();
            if short.len() < p.len() {
                format!(" {short}… ")
            } else {
                format!(" {short} ")
            }
        },
    );

    let mut block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));
    if total > 0 {
        block = block.title_bottom(
            Line::from(format!(" {done}/{total} done ")).alignment(Alignment::Right),
        );
    }

    if !planner.has_plan() {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No plan yet. Describe your day above and press Enter.",
                Style::default().fg(DIMMED),
            )),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = planner
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| ListItem::new(row_lines(entry, focused && i == selected, width)))
        .collect();

    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}
