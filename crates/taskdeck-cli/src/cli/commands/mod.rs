//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod tasks;
pub mod tui;

use anyhow::{Context, Result};
use taskdeck_core::backend::BackendClient;
use taskdeck_core::config::{Config, paths};
use taskdeck_core::session::{Identity, SessionStore};
use taskdeck_core::tasks::TaskRepository;

const NOT_SIGNED_IN: &str = "Not signed in. Run `taskdeck login --email <email>`.";

/// Session store and repository sharing one client, built from config.
pub struct Backend {
    pub store: SessionStore,
    pub repo: TaskRepository,
}

impl Backend {
    pub fn connect(config: &Config) -> Result<Self> {
        let settings = config.backend_settings()?;
        let client = BackendClient::new(&settings).context("create backend client")?;
        Ok(Self {
            store: SessionStore::new(client.clone(), Some(paths::session_path())),
            repo: TaskRepository::new(client, settings.tasks_table),
        })
    }

    /// Identity of the stored session, refreshed if needed.
    pub async fn identity(&self) -> Result<Identity> {
        let session = self.store.restore_session().await.context(NOT_SIGNED_IN)?;
        Ok(session.identity())
    }
}
