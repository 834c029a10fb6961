//! Account command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use taskdeck_core::backend::SignUpOutcome;
use taskdeck_core::config::Config;

use super::Backend;

pub async fn login(config: &Config, email: &str) -> Result<()> {
    let email = require_email(email)?;
    let backend = Backend::connect(config)?;
    let password = read_password()?;

    backend.store.sign_in(email, &password).await?;
    let label = backend
        .store
        .current()
        .map_or_else(|| email.to_string(), |s| s.label().to_string());
    println!("Signed in as {label}");
    Ok(())
}

pub async fn signup(config: &Config, email: &str) -> Result<()> {
    let email = require_email(email)?;
    let backend = Backend::connect(config)?;
    let password = read_password()?;

    match backend.store.sign_up(email, &password).await? {
        SignUpOutcome::SignedIn(session) => {
            println!("Account created. Signed in as {}", session.label());
        }
        SignUpOutcome::ConfirmationRequired { email: sent_to } => {
            let sent_to = sent_to.as_deref().unwrap_or(email);
            println!("Check {sent_to} for a confirmation link, then sign in.");
        }
    }
    Ok(())
}

pub async fn logout(config: &Config) -> Result<()> {
    let backend = Backend::connect(config)?;
    if backend.store.restore_session().await.is_none() {
        // Forget a stored session that could not be restored.
        backend.store.sign_out().await?;
        println!("Not signed in.");
        return Ok(());
    }
    backend.store.sign_out().await?;
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(config: &Config) -> Result<()> {
    let backend = Backend::connect(config)?;
    let identity = backend.identity().await?;
    let user = backend
        .store
        .client()
        .get_user(&identity.access_token)
        .await
        .context("Failed to verify session")?;
    let label = user.email.as_deref().unwrap_or(&user.id);
    println!("{label} ({})", user.id);
    Ok(())
}

fn require_email(email: &str) -> Result<&str> {
    let email = email.trim();
    if email.is_empty() {
        anyhow::bail!("Email cannot be empty");
    }
    Ok(email)
}

/// Reads one line from stdin. Prompts only when attached to a terminal.
fn read_password() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
        io::stderr().flush()?;
    }

    let mut line = String::new();
    stdin.lock().read_line(&mut line).context("read password")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }
    Ok(password.to_string())
}
