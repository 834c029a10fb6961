//! Full-screen terminal UI for taskdeck.
//!
//! Elm-style split: `update` is the only place state changes, `render` only
//! reads it, and `runtime` executes the effects the reducer returns.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr, stdout};
use std::sync::Arc;

use anyhow::Result;
pub use features::{auth, tasks};
pub use runtime::TuiRuntime;
use taskdeck_core::backend::BackendClient;
use taskdeck_core::config::{Config, paths};
use taskdeck_core::session::SessionStore;
use taskdeck_core::tasks::TaskRepository;

/// Runs the interactive task list until the user quits.
///
/// Must be called from within a multi-threaded tokio runtime; the event loop
/// blocks the calling thread while handlers run on the workers.
pub fn run_interactive(config: &Config) -> Result<()> {
    if !stdout().is_terminal() {
        anyhow::bail!(
            "The task screen requires a terminal.\n\
             Use `taskdeck tasks list` for non-interactive use."
        );
    }

    let settings = config.backend_settings()?;
    let client = BackendClient::new(&settings)?;
    let store = Arc::new(SessionStore::new(
        client.clone(),
        Some(paths::session_path()),
    ));
    let repo = TaskRepository::new(client, settings.tasks_table);
    tracing::info!(backend = %settings.url, "starting task screen");

    let mut runtime = TuiRuntime::new(store, repo)?;
    runtime.run()?;
    drop(runtime);

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
