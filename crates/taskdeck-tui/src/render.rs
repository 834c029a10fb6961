//! Pure view functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui `Frame`, and never
//! mutate state or return effects.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::common::text::sanitize_for_display;
use crate::state::{AppState, Screen};
use crate::{auth, tasks};

const HEADER_HEIGHT: u16 = 1;
const FOOTER_HEIGHT: u16 = 1;
const APP_TITLE: &str = " Task Manager";

/// Spinner frames for background activity.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

pub const RESTORING_TEXT: &str = "Restoring session...";

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Min(1),
        Constraint::Length(FOOTER_HEIGHT),
    ])
    .areas(frame.area());

    render_header(frame, app, header);
    match app.screen() {
        Screen::Restoring => {
            let line = Line::from(Span::styled(
                format!("{} {RESTORING_TEXT}", spinner(app.spinner_frame)),
                Style::default().fg(Color::DarkGray),
            ));
            let y = body.y + body.height / 2;
            let area = Rect::new(body.x, y, body.width, 1);
            frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
        }
        Screen::Auth => auth::render_auth_screen(frame, app, body),
        Screen::Tasks => {
            let padded = body.inner(ratatui::layout::Margin::new(1, 0));
            tasks::render_task_screen(frame, app, padded);
        }
    }
    render_footer(frame, app, footer);
}

pub fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

/// Title on the left, signed-in user on the right.
fn render_header(frame: &mut Frame, app: &AppState, area: Rect) {
    let user = app
        .session
        .current
        .as_ref()
        .map(|s| format!("{} ", s.label()));
    let title_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut spans = vec![Span::styled(APP_TITLE, title_style)];
    if let Some(user) = user {
        let gap = (area.width as usize).saturating_sub(APP_TITLE.width() + user.width());
        spans.push(Span::raw(" ".repeat(gap)));
        spans.push(Span::styled(user, Style::default().fg(Color::Green)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer(frame: &mut Frame, app: &AppState, area: Rect) {
    let hint = match app.screen() {
        Screen::Tasks => {
            let busy = if app.jobs.is_any_running() {
                format!("{} ", spinner(app.spinner_frame))
            } else {
                String::new()
            };
            format!(
                " {busy}Enter add · ↑↓ select · Space/Ctrl+T toggle · Del/Ctrl+D delete · Ctrl+O sign out · Esc quit"
            )
        }
        Screen::Auth | Screen::Restoring => " Ctrl+C quit".to_string(),
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        ))),
        area,
    );
}

/// Height the error banner needs at `width` (0 when there is no error).
pub fn error_banner_height(error: Option<&str>, width: u16) -> u16 {
    let Some(error) = error else {
        return 0;
    };
    let inner = usize::from(width.saturating_sub(2).max(1));
    let lines = sanitize_for_display(error).width().div_ceil(inner).max(1);
    (lines as u16).saturating_add(2)
}

/// Shared error banner for the last failed operation.
pub fn render_error_banner(frame: &mut Frame, error: Option<&str>, area: Rect) {
    let Some(error) = error else {
        return;
    };
    if area.height == 0 {
        return;
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Error ");
    let paragraph = Paragraph::new(Span::styled(
        sanitize_for_display(error),
        Style::default().fg(Color::Red),
    ))
    .wrap(Wrap { trim: true })
    .block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use taskdeck_core::session::{Session, User};
    use taskdeck_core::tasks::Task;

    use super::*;
    use crate::tasks::{EMPTY_TEXT, LOADING_TEXT};

    fn draw(app: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn signed_in() -> AppState {
        let mut app = AppState::new();
        app.begin_session(Session {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_at: i64::MAX,
            user: User {
                id: "u-a".into(),
                email: Some("a@x.com".into()),
            },
        });
        app
    }

    #[test]
    fn startup_shows_restoring() {
        assert!(draw(&AppState::new()).contains(RESTORING_TEXT));
    }

    #[test]
    fn signed_out_shows_auth_form() {
        let mut app = AppState::new();
        app.session.restoring = false;
        app.auth.password.insert_str("hunter2");
        let screen = draw(&app);
        assert!(screen.contains("Email"));
        assert!(screen.contains("Password"));
        assert!(!screen.contains("hunter2"));
    }

    #[test]
    fn loading_then_empty_placeholder() {
        let mut app = signed_in();
        let screen = draw(&app);
        assert!(screen.contains(LOADING_TEXT));
        assert!(screen.contains("a@x.com"));

        app.tasks.loading = false;
        assert!(draw(&app).contains(EMPTY_TEXT));
    }

    #[test]
    fn tasks_and_error_banner_render() {
        let mut app = signed_in();
        app.tasks.loading = false;
        app.tasks.list.replace(vec![Task {
            id: "1".into(),
            title: "Buy milk".into(),
            completed: true,
            created_at: Utc::now(),
            user_id: "u-a".into(),
        }]);
        app.set_error("JWT expired");

        let screen = draw(&app);
        assert!(screen.contains("[x] Buy milk"));
        assert!(screen.contains("JWT expired"));
    }

    #[test]
    fn banner_height_grows_with_message() {
        assert_eq!(error_banner_height(None, 40), 0);
        assert_eq!(error_banner_height(Some("short"), 40), 3);
        assert_eq!(error_banner_height(Some(&"x".repeat(60)), 40), 4);
    }
}
