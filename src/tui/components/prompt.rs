//! Prompt input bar.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use super::{BRAND_TEAL, DIMMED};

const INPUT_BG: Color = Color::Rgb(22, 24, 28);

pub const PROMPT_TITLE: &str = " What do you want to plan? ";
pub const PLACEHOLDERS: &[&str] = &[
    "e.g. Saturday: farmers market, laundry, dinner with Sam at 7",
    "e.g. study for the biology exam between 2pm and 8pm",
    "e.g. a productive work-from-home Monday",
    "e.g. pack and move apartments in one day",
];

/// Single-line text input with a cursor.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    text: String,
    cursor: usize, // Byte offset into text
}

impl InputBuffer {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Cursor position in characters.
    #[must_use]
    pub fn cursor_col(&self) -> usize {
        self.text[..self.cursor].chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Insert pasted text, turning line breaks and tabs into spaces.
    pub fn insert_str(&mut self, s: &str) {
        for c in s.trim_end_matches(['\n', '\r']).chars() {
            match c {
                '\n' | '\r' | '\t' => self.insert_char(' '),
                c if c.is_control() => {}
                c => self.insert_char(c),
            }
        }
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if let Some((i, _)) = self.text[..self.cursor].char_indices().next_back() {
            self.text.replace_range(i..self.cursor, "");
            self.cursor = i;
        }
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) {
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.text
                .replace_range(self.cursor..self.cursor + c.len_utf8(), "");
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.text[..self.cursor]
            .char_indices()
            .next_back()
            .map_or(0, |(i, _)| i);
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub const fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }
}

/// Render the prompt bar, returning the cursor position when focused.
#[allow(clippy::cast_possible_truncation)]
pub fn render_prompt(
    frame: &mut Frame,
    area: Rect,
    input: &InputBuffer,
    placeholder: &str,
    focused: bool,
) -> Option<(u16, u16)> {
    let border_color = if focused { BRAND_TEAL } else { DIMMED };

    let block = Block::default()
        .title(Span::styled(
            PROMPT_TITLE,
            Style::default()
                .fg(border_color)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(INPUT_BG));

    let inner = block.inner(area);
    let width = inner.width.saturating_sub(1) as usize;

    // Keep the cursor visible on long inputs
    let col = input.cursor_col();
    let skip = col.saturating_sub(width);

    let line = if input.is_empty() {
        Line::from(vec![
            Span::raw(" "),
            Span::styled(placeholder.to_string(), Style::default().fg(DIMMED)),
        ])
    } else {
        let visible: String = input.text().chars().skip(skip).take(width).collect();
        Line::from(vec![
            Span::raw(" "),
            Span::styled(visible, Style::default().fg(Color::White)),
        ])
    };

    frame.render_widget(Paragraph::new(line).block(block), area);

    focused.then(|| {
        let x = inner.x + 1 + (col - skip).min(u16::MAX as usize) as u16;
        (x.min(inner.right().saturating_sub(1)), inner.y)
    })
}
