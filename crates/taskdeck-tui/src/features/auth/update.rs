//! Auth feature reducer.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use taskdeck_core::backend::SignUpOutcome;

use super::AuthField;
use crate::effects::UiEffect;
use crate::events::AuthUiEvent;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
enum Submit {
    SignIn,
    SignUp,
}

/// Handles a key press on the auth screen.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => vec![UiEffect::Quit],
        KeyCode::Char('c') if ctrl => vec![UiEffect::Quit],
        KeyCode::Char('u') if ctrl => submit(app, Submit::SignUp),
        KeyCode::Enter => submit(app, Submit::SignIn),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.auth.focus = app.auth.focus.toggle();
            vec![]
        }
        _ => {
            app.auth.focused_mut().handle_key(key);
            vec![]
        }
    }
}

fn submit(app: &mut AppState, kind: Submit) -> Vec<UiEffect> {
    if app.jobs.auth.is_running() {
        return vec![];
    }
    let Some((email, password)) = app.auth.credentials() else {
        if app.auth.focus == AuthField::Email && !app.auth.email.is_empty() {
            app.auth.focus = AuthField::Password;
        }
        return vec![];
    };

    app.auth.notice = None;
    let job = app.job_seq.next_id();
    match kind {
        Submit::SignIn => vec![UiEffect::SignIn {
            job,
            email,
            password,
        }],
        Submit::SignUp => vec![UiEffect::SignUp {
            job,
            email,
            password,
        }],
    }
}

/// Applies the result of a session operation.
///
/// Successful sign-in/sign-up clears the banner; the session itself arrives
/// through the store's `SignedIn` event.
pub fn handle_auth_result(app: &mut AppState, event: AuthUiEvent) {
    match event {
        AuthUiEvent::SignInFinished(Ok(())) => {
            app.error = None;
            app.auth.clear_secret();
        }
        AuthUiEvent::SignUpFinished(Ok(outcome)) => {
            app.error = None;
            match outcome {
                SignUpOutcome::SignedIn(_) => app.auth.clear_secret(),
                SignUpOutcome::ConfirmationRequired { email } => {
                    let target = email.as_deref().unwrap_or("your inbox");
                    app.auth.notice = Some(format!(
                        "Check {target} for a confirmation link, then sign in."
                    ));
                }
            }
        }
        AuthUiEvent::SignOutFinished(Ok(())) => app.end_session(),
        AuthUiEvent::SignInFinished(Err(message))
        | AuthUiEvent::SignUpFinished(Err(message))
        | AuthUiEvent::SignOutFinished(Err(message)) => app.set_error(message),
    }
}
