//! Interactive task screen.

use anyhow::Result;
use taskdeck_core::config::Config;

#[cfg(feature = "tui")]
pub fn run(config: &Config) -> Result<()> {
    taskdeck_tui::run_interactive(config)
}

#[cfg(not(feature = "tui"))]
pub fn run(_config: &Config) -> Result<()> {
    anyhow::bail!("This build has no task screen. Use `taskdeck tasks list` instead.")
}
