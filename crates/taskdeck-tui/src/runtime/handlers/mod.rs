//! Effect handlers for the TUI runtime.
//!
//! Handlers are pure async functions returning a `UiEvent`; the runtime
//! spawns them and sends the result to its inbox. They never touch state.
//!
//! Errors are flattened to their display chain (`{:#}`) here, which is the
//! single message the banner shows.

pub mod auth;
pub mod tasks;

pub use auth::*;
pub use tasks::*;
