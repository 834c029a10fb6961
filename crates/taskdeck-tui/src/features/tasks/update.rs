//! Task feature reducer.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::effects::UiEffect;
use crate::events::TasksUiEvent;
use crate::state::AppState;

/// Handles a key press on the task screen.
///
/// Space and Delete act on the selected task only while the title input is
/// empty; otherwise they edit the input.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let input_empty = app.tasks.input.is_empty();
    match key.code {
        KeyCode::Esc => vec![UiEffect::Quit],
        KeyCode::Char('c') if ctrl => vec![UiEffect::Quit],
        KeyCode::Char('o') if ctrl => sign_out(app),
        KeyCode::Char('t') if ctrl => toggle_selected(app),
        KeyCode::Char(' ') if input_empty => toggle_selected(app),
        KeyCode::Char('d') if ctrl => delete_selected(app),
        KeyCode::Delete if input_empty => delete_selected(app),
        KeyCode::Up => {
            app.tasks.select_prev();
            vec![]
        }
        KeyCode::Down => {
            app.tasks.select_next();
            vec![]
        }
        KeyCode::Enter => submit_title(app),
        _ => {
            app.tasks.input.handle_key(key);
            vec![]
        }
    }
}

fn submit_title(app: &mut AppState) -> Vec<UiEffect> {
    let title = app.tasks.input.text().trim().to_string();
    if title.is_empty() {
        return vec![];
    }
    let identity = match app.identity() {
        Ok(identity) => identity,
        Err(message) => {
            app.set_error(message);
            return vec![];
        }
    };
    app.tasks.input.clear();
    vec![UiEffect::CreateTask { identity, title }]
}

fn toggle_selected(app: &mut AppState) -> Vec<UiEffect> {
    let Some(task) = app.tasks.selected_task() else {
        return vec![];
    };
    let (id, completed) = (task.id.clone(), task.completed);
    match app.identity() {
        Ok(identity) => vec![UiEffect::ToggleTask {
            identity,
            id,
            completed,
        }],
        Err(message) => {
            app.set_error(message);
            vec![]
        }
    }
}

fn delete_selected(app: &mut AppState) -> Vec<UiEffect> {
    let Some(task) = app.tasks.selected_task() else {
        return vec![];
    };
    let id = task.id.clone();
    match app.identity() {
        Ok(identity) => vec![UiEffect::DeleteTask { identity, id }],
        Err(message) => {
            app.set_error(message);
            vec![]
        }
    }
}

fn sign_out(app: &mut AppState) -> Vec<UiEffect> {
    if app.jobs.auth.is_running() {
        return vec![];
    }
    let job = app.job_seq.next_id();
    vec![UiEffect::SignOut { job }]
}

/// Applies the result of a repository call.
///
/// Results issued for another identity (or before a sign-out) are dropped.
/// Failures leave the list untouched and overwrite the banner.
pub fn handle_tasks_result(app: &mut AppState, event: TasksUiEvent) {
    if app.session.user_id() != Some(event.owner()) {
        tracing::debug!("dropping task result for a previous session");
        return;
    }

    let tasks = &mut app.tasks;
    let failure = match event {
        TasksUiEvent::Loaded { result, .. } => {
            tasks.loading = false;
            result.map(|list| {
                tasks.list.replace(list);
                tasks.clamp_selection();
            })
        }
        TasksUiEvent::Created { result, .. } => result.map(|task| {
            tasks.list.prepend(task);
            tasks.selected = 0;
        }),
        TasksUiEvent::Toggled {
            id,
            completed,
            result,
            ..
        } => result.map(|()| {
            tasks.list.set_completed(&id, completed);
        }),
        TasksUiEvent::Deleted { id, result, .. } => result.map(|()| {
            tasks.list.remove(&id);
            tasks.clamp_selection();
        }),
    };

    if let Err(message) = failure {
        app.set_error(message);
    }
}
