//! Application state composition.
//!
//! ```text
//! AppState
//! ├── session: SessionView   (restoring flag, current session)
//! ├── auth: AuthState        (email/password form, notice)
//! ├── tasks: TasksState      (task list, title input, selection, loading)
//! ├── error: Option<String>  (shared error banner)
//! ├── job_seq / jobs         (async job lifecycle)
//! └── should_quit
//! ```
//!
//! The visible screen is derived from the session, never stored separately.

use taskdeck_core::session::{Identity, Session};

use crate::auth::AuthState;
use crate::common::{JobSeq, Jobs};
use crate::tasks::TasksState;

/// Message for gestures that need a session while signed out.
pub const NOT_SIGNED_IN: &str = "Not signed in";

/// Which screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Startup recovery still running.
    Restoring,
    Auth,
    Tasks,
}

/// Session as seen by the UI.
#[derive(Debug, Default)]
pub struct SessionView {
    pub restoring: bool,
    pub current: Option<Session>,
}

impl SessionView {
    pub fn user_id(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.user.id.as_str())
    }
}

/// Top-level TUI state.
#[derive(Debug, Default)]
pub struct AppState {
    pub session: SessionView,
    pub auth: AuthState,
    pub tasks: TasksState,
    /// Last failure, shown in the banner until overwritten or cleared.
    pub error: Option<String>,
    pub job_seq: JobSeq,
    pub jobs: Jobs,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    /// State at startup: recovery pending.
    pub fn new() -> Self {
        Self {
            session: SessionView {
                restoring: true,
                current: None,
            },
            ..Self::default()
        }
    }

    pub fn screen(&self) -> Screen {
        if self.session.current.is_some() {
            Screen::Tasks
        } else if self.session.restoring {
            Screen::Restoring
        } else {
            Screen::Auth
        }
    }

    /// Identity for a repository call, or the banner message when signed out.
    pub fn identity(&self) -> Result<Identity, &'static str> {
        self.session
            .current
            .as_ref()
            .map(Session::identity)
            .ok_or(NOT_SIGNED_IN)
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Installs a newly established session.
    ///
    /// A different user than before starts from an empty list.
    pub fn begin_session(&mut self, session: Session) {
        if self.session.user_id() != Some(session.user.id.as_str()) {
            self.tasks.reset();
        }
        self.session.restoring = false;
        self.session.current = Some(session);
        self.tasks.loading = true;
    }

    /// Drops the session and everything scoped to it.
    pub fn end_session(&mut self) {
        self.session.restoring = false;
        self.session.current = None;
        self.tasks.reset();
        self.jobs.fetch_tasks.clear();
        self.auth.clear_secret();
    }
}
