//! Task screen view.

use chrono::Local;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use taskdeck_core::tasks::Task;
use unicode_width::UnicodeWidthStr;

use crate::common::text::{sanitize_for_display, truncate_with_ellipsis};
use crate::render::{error_banner_height, render_error_banner};
use crate::state::AppState;

pub const LOADING_TEXT: &str = "Loading tasks...";
pub const EMPTY_TEXT: &str = "No tasks yet. Add one above!";

/// Width of the `[x] ` prefix.
const CHECKBOX_WIDTH: usize = 4;
/// Width of the creation date column (`Jan 02 15:04`) plus gap.
const DATE_WIDTH: usize = 14;

/// Renders title input, error banner and the task list.
pub fn render_task_screen(frame: &mut Frame, app: &AppState, area: Rect) {
    let banner_height = error_banner_height(app.error.as_deref(), area.width);
    let [input_area, banner_area, list_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(banner_height),
        Constraint::Min(1),
    ])
    .areas(area);

    render_input(frame, app, input_area);
    render_error_banner(frame, app.error.as_deref(), banner_area);
    render_list(frame, app, list_area);
}

fn render_input(frame: &mut Frame, app: &AppState, area: Rect) {
    let input = &app.tasks.input;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" New task ");
    let inner = block.inner(area);

    let paragraph = if input.is_empty() {
        Paragraph::new(Span::styled(
            "What needs to be done?",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(input.text())
    };
    frame.render_widget(paragraph.block(block), area);

    let x = inner.x + input.cursor_column(false).min(inner.width.saturating_sub(1));
    frame.set_cursor_position(Position::new(x, inner.y));
}

fn render_list(frame: &mut Frame, app: &AppState, area: Rect) {
    let tasks = &app.tasks;
    let placeholder = if tasks.loading {
        Some(LOADING_TEXT)
    } else if tasks.list.is_empty() {
        Some(EMPTY_TEXT)
    } else {
        None
    };
    if let Some(text) = placeholder {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area.inner(ratatui::layout::Margin::new(0, 1)));
        return;
    }

    let width = area.width as usize;
    let items: Vec<ListItem> = tasks.list.iter().map(|task| task_item(task, width)).collect();
    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("› ");
    let mut state = ListState::default().with_selected(Some(tasks.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn task_item(task: &Task, width: usize) -> ListItem<'static> {
    let (checkbox, title_style) = if task.completed {
        (
            "[x] ",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
        )
    } else {
        ("[ ] ", Style::default().fg(Color::White))
    };

    let created = task
        .created_at
        .with_timezone(&Local)
        .format("%b %d %H:%M")
        .to_string();

    // Room for the highlight symbol, checkbox and date column.
    let title_width = width.saturating_sub(2 + CHECKBOX_WIDTH + DATE_WIDTH).max(1);
    let title = truncate_with_ellipsis(&sanitize_for_display(&task.title), title_width);
    let padding = title_width.saturating_sub(title.width()) + 2;

    ListItem::new(Line::from(vec![
        Span::styled(checkbox, Style::default().fg(Color::Cyan)),
        Span::styled(title, title_style),
        Span::raw(" ".repeat(padding)),
        Span::styled(created, Style::default().fg(Color::DarkGray)),
    ]))
}
