//! Config command handlers.

use anyhow::Result;
use taskdeck_core::config::{self, paths};

pub fn path() -> Result<()> {
    println!("{}", paths::config_path().display());
    Ok(())
}

pub fn init() -> Result<()> {
    let config_path = paths::config_path();
    config::Config::init(&config_path)?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn set_backend(url: &str, anon_key: &str) -> Result<()> {
    config::Config::save_backend(url.trim(), anon_key.trim())?;
    println!("Saved backend settings to {}", paths::config_path().display());
    Ok(())
}
