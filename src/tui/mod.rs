//! Terminal user interface for taskplan.

mod app;
mod components;
mod state;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::build_info;
use crate::config::Config;

pub use app::App;
use components::{BRAND_TEAL, DIMMED, ERROR_RED, render_prompt, render_task_list};
use state::Focus;

/// Run the TUI application.
///
/// # Errors
///
/// Returns an error if terminal initialization fails or the event loop encounters an error.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let mut app = App::new(config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    if app.mouse {
        execute!(stdout, EnableMouseCapture)?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    if app.mouse {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(80)) => {
                app.advance_tick();
                while event::poll(Duration::from_millis(0))? {
                    match event::read()? {
                        Event::Key(key) => {
                            // Some terminals don't report KeyEventKind correctly, so only skip Release
                            if key.kind != KeyEventKind::Release
                                && handle_key(app, key.code, key.modifiers)
                            {
                                return Ok(());
                            }
                        }
                        Event::Paste(text) => {
                            app.focus = Focus::Input;
                            app.input.insert_str(&text);
                        }
                        Event::Mouse(mouse) => match mouse.kind {
                            MouseEventKind::ScrollUp => app.select_previous(),
                            MouseEventKind::ScrollDown => app.select_next(),
                            _ => {}
                        },
                        _ => {}
                    }
                }
            }

            Some(message) = app.plan_rx.recv() => {
                app.handle_plan_message(message);
            }
        }
    }
}

/// Handle a key press. Returns `true` to quit.
fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> bool {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match code {
            KeyCode::Char('c') => return true,
            KeyCode::Char('u') if app.focus == Focus::Input => app.input.clear(),
            KeyCode::Char('a') if app.focus == Focus::Input => app.input.home(),
            KeyCode::Char('e') if app.focus == Focus::Input => app.input.end(),
            _ => {}
        }
        return false;
    }

    if code == KeyCode::Tab || code == KeyCode::BackTab {
        app.toggle_focus();
        return false;
    }

    match app.focus {
        Focus::Input => match code {
            KeyCode::Enter => app.submit(),
            KeyCode::Esc => {
                if app.input.is_empty() {
                    return true;
                }
                app.input.clear();
            }
            KeyCode::Char(c) => app.input.insert_char(c),
            KeyCode::Backspace => app.input.backspace(),
            KeyCode::Delete => app.input.delete(),
            KeyCode::Left => app.input.move_left(),
            KeyCode::Right => app.input.move_right(),
            KeyCode::Home => app.input.home(),
            KeyCode::End => app.input.end(),
            KeyCode::Down if app.planner.has_plan() => app.focus = Focus::List,
            _ => {}
        },
        Focus::List => match code {
            KeyCode::Esc | KeyCode::Char('q') => return true,
            KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::Enter | KeyCode::Right | KeyCode::Left | KeyCode::Char('l' | 'h') => {
                app.toggle_expanded();
            }
            KeyCode::Char(' ' | 'x') => app.toggle_done(),
            KeyCode::Char('/' | 'i') => app.focus = Focus::Input,
            _ => {}
        },
    }

    false
}

fn draw(f: &mut Frame, app: &App) {
    let full_area = f.area();
    let area = Rect::new(
        full_area.x + 1,
        full_area.y,
        full_area.width.saturating_sub(2),
        full_area.height,
    );

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header
        Constraint::Length(3), // Prompt
        Constraint::Length(1), // Status
        Constraint::Min(3),    // Plan
        Constraint::Length(1), // Help
    ])
    .split(area);

    render_header(f, chunks[0], app);

    if let Some((x, y)) = render_prompt(
        f,
        chunks[1],
        &app.input,
        app.placeholder,
        app.focus == Focus::Input,
    ) {
        f.set_cursor_position(Position::new(x, y));
    }

    render_status(f, chunks[2], app);
    render_task_list(
        f,
        chunks[3],
        &app.planner,
        app.selected,
        app.focus == Focus::List,
    );
    render_help(f, chunks[4], app.focus);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            "taskplan",
            Style::default().fg(BRAND_TEAL).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", build_info::short_version()),
            Style::default().fg(DIMMED),
        ),
    ];
    if !app.model.is_empty() {
        spans.push(Span::styled(
            format!("  ·  {}", app.model),
            Style::default().fg(DIMMED),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn status_line(app: &App) -> Line<'static> {
    if app.planner.is_loading {
        return Line::from(vec![
            Span::styled(format!(" {} ", app.spinner()), Style::default().fg(BRAND_TEAL)),
            Span::styled("Planning...", Style::default().fg(Color::White)),
        ]);
    }

    if let Some(error) = &app.planner.error {
        return Line::from(Span::styled(
            format!(" ✗ {error}"),
            Style::default().fg(ERROR_RED),
        ));
    }

    app.notice.as_ref().map_or_else(Line::default, |notice| {
        Line::from(Span::styled(
            format!(" {notice}"),
            Style::default().fg(DIMMED),
        ))
    })
}

fn render_status(f: &mut Frame, area: Rect, app: &App) {
    f.render_widget(Paragraph::new(status_line(app)), area);
}

fn render_help(f: &mut Frame, area: Rect, focus: Focus) {
    let keys: &[(&str, &str)] = match focus {
        Focus::Input => &[
            ("Enter", " plan  "),
            ("Tab", " list  "),
            ("Esc", " clear  "),
            ("Ctrl+C", " quit"),
        ],
        Focus::List => &[
            ("↑↓", " navigate  "),
            ("Enter", " details  "),
            ("Space", " done  "),
            ("Tab", " prompt  "),
            ("Esc", " quit"),
        ],
    };

    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(*key, Style::default().fg(BRAND_TEAL)),
                Span::styled(*label, Style::default().fg(DIMMED)),
            ]
        })
        .collect();

    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}
