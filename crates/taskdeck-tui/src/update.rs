//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use taskdeck_core::session::{Session, SessionEvent};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, Screen};
use crate::{auth, tasks};

/// Effects to run once before the first event.
pub fn init(app: &mut AppState) -> Vec<UiEffect> {
    let job = app.job_seq.next_id();
    vec![UiEffect::RestoreSession { job }]
}

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::Session(session_event) => handle_session_event(app, session_event),
        UiEvent::SessionRestored(restored) => {
            app.session.restoring = false;
            match restored {
                // A sign-in that completed meanwhile wins.
                Some(session) if app.session.current.is_none() => establish(app, session),
                _ => vec![],
            }
        }
        UiEvent::JobStarted { kind, started } => {
            app.jobs.state_mut(kind).on_started(started);
            vec![]
        }
        UiEvent::JobCompleted { kind, completed } => {
            if !app.jobs.state_mut(kind).finish_if_active(completed.id) {
                tracing::debug!(?kind, "dropping superseded job result");
                return vec![];
            }
            update(app, *completed.result)
        }
        UiEvent::Auth(result) => {
            auth::handle_auth_result(app, result);
            vec![]
        }
        UiEvent::Tasks(result) => {
            tasks::handle_tasks_result(app, result);
            vec![]
        }
    }
}

fn handle_session_event(app: &mut AppState, event: SessionEvent) -> Vec<UiEffect> {
    match event {
        SessionEvent::SignedIn(session) => establish(app, session),
        SessionEvent::TokenRefreshed(session) => {
            if app.session.user_id() == Some(session.user.id.as_str()) {
                app.session.current = Some(session);
            }
            vec![]
        }
        SessionEvent::SignedOut => {
            app.end_session();
            vec![]
        }
    }
}

/// Installs a session and starts the task fetch for it.
fn establish(app: &mut AppState, session: Session) -> Vec<UiEffect> {
    let identity = session.identity();
    app.begin_session(session);
    let job = app.job_seq.next_id();
    vec![UiEffect::FetchTasks { job, identity }]
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match app.screen() {
            Screen::Auth => auth::handle_key(app, key),
            Screen::Tasks => tasks::handle_key(app, key),
            Screen::Restoring => {
                let ctrl_c = key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL);
                if ctrl_c || key.code == KeyCode::Esc {
                    vec![UiEffect::Quit]
                } else {
                    vec![]
                }
            }
        },
        Event::Paste(text) => {
            match app.screen() {
                Screen::Auth => app.auth.focused_mut().insert_str(&text),
                Screen::Tasks => app.tasks.input.insert_str(&text),
                Screen::Restoring => {}
            }
            vec![]
        }
        _ => vec![],
    }
}
