//! UI event types.
//!
//! Every input to the TUI (terminal, session transitions, async results) is
//! converted to a `UiEvent` before the reducer sees it.
//!
//! ## Job Lifecycle Events
//!
//! - The runtime emits `UiEvent::JobStarted` once a job is actually spawned
//! - The runtime emits `UiEvent::JobCompleted` wrapping the result event
//! - The reducer is the only place that mutates `JobState`
//!
//! Results of remote task operations carry the user id they were issued for,
//! so the reducer can drop anything that arrives after the identity changed.

use crossterm::event::Event as CrosstermEvent;
use taskdeck_core::backend::SignUpOutcome;
use taskdeck_core::session::{Session, SessionEvent};
use taskdeck_core::tasks::Task;

use crate::common::{JobCompleted, JobKind, JobStarted};

/// Results of session operations started from the auth or task screen.
#[derive(Debug)]
pub enum AuthUiEvent {
    SignInFinished(Result<(), String>),
    SignUpFinished(Result<SignUpOutcome, String>),
    SignOutFinished(Result<(), String>),
}

/// Results of task repository calls.
#[derive(Debug)]
pub enum TasksUiEvent {
    Loaded {
        owner: String,
        result: Result<Vec<Task>, String>,
    },
    Created {
        owner: String,
        result: Result<Task, String>,
    },
    /// `completed` is the value written to the backend.
    Toggled {
        owner: String,
        id: String,
        completed: bool,
        result: Result<(), String>,
    },
    Deleted {
        owner: String,
        id: String,
        result: Result<(), String>,
    },
}

impl TasksUiEvent {
    pub fn owner(&self) -> &str {
        match self {
            TasksUiEvent::Loaded { owner, .. }
            | TasksUiEvent::Created { owner, .. }
            | TasksUiEvent::Toggled { owner, .. }
            | TasksUiEvent::Deleted { owner, .. } => owner,
        }
    }
}

/// Unified event enum for the TUI.
#[derive(Debug)]
pub enum UiEvent {
    /// Timer tick (spinner animation, render cadence).
    Tick,

    /// Terminal input event (key, paste, resize).
    Terminal(CrosstermEvent),

    /// Transition reported by the session store.
    Session(SessionEvent),

    /// Startup recovery finished.
    SessionRestored(Option<Session>),

    JobStarted {
        kind: JobKind,
        started: JobStarted,
    },

    JobCompleted {
        kind: JobKind,
        completed: JobCompleted<Box<UiEvent>>,
    },

    Auth(AuthUiEvent),

    Tasks(TasksUiEvent),
}
