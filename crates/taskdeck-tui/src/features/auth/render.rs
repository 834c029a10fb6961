//! Auth screen view.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::AuthField;
use crate::common::LineInput;
use crate::render::{error_banner_height, render_error_banner};
use crate::state::AppState;

const FORM_WIDTH: u16 = 56;

/// Renders the sign-in/sign-up form centered in `area`.
pub fn render_auth_screen(frame: &mut Frame, app: &AppState, area: Rect) {
    let auth = &app.auth;
    let banner_height = error_banner_height(app.error.as_deref(), FORM_WIDTH);
    let notice_height = u16::from(auth.notice.is_some()) * 2;
    let form_height = 3 + 3 + 1 + banner_height + notice_height + 2;

    let width = FORM_WIDTH.min(area.width);
    let height = form_height.min(area.height);
    let form = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Sign in ");
    let inner = block.inner(form);
    frame.render_widget(block, form);

    let [email_area, password_area, status_area, notice_area, banner_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(notice_height),
        Constraint::Length(banner_height),
    ])
    .areas(inner);

    render_field(
        frame,
        email_area,
        "Email",
        &auth.email,
        false,
        auth.focus == AuthField::Email,
    );
    render_field(
        frame,
        password_area,
        "Password",
        &auth.password,
        true,
        auth.focus == AuthField::Password,
    );

    let status = if app.jobs.auth.is_running() {
        Line::from(Span::styled(
            format!("{} Working...", crate::render::spinner(app.spinner_frame)),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(
            "Enter sign in · Ctrl+U sign up · Tab switch · Esc quit",
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(status), status_area);

    if let Some(notice) = &auth.notice {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                notice.as_str(),
                Style::default().fg(Color::Green),
            )))
            .wrap(Wrap { trim: true }),
            notice_area,
        );
    }

    render_error_banner(frame, app.error.as_deref(), banner_area);
}

fn render_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    input: &LineInput,
    masked: bool,
    focused: bool,
) {
    let border = if focused {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!(" {label} "));
    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(input.display(masked)).block(block), area);

    if focused {
        let x = inner.x + input.cursor_column(masked).min(inner.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(x, inner.y));
    }
}
