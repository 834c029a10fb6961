//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only; the reducer never performs
//! either directly.

use taskdeck_core::session::Identity;

use crate::common::JobId;

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Recover a persisted session.
    RestoreSession { job: JobId },

    SignIn {
        job: JobId,
        email: String,
        password: String,
    },

    SignUp {
        job: JobId,
        email: String,
        password: String,
    },

    SignOut { job: JobId },

    /// Load the task list for `identity`.
    FetchTasks { job: JobId, identity: Identity },

    CreateTask { identity: Identity, title: String },

    /// Flip `completed` on the backend (sends `!completed`).
    ToggleTask {
        identity: Identity,
        id: String,
        completed: bool,
    },

    DeleteTask { identity: Identity, id: String },
}
