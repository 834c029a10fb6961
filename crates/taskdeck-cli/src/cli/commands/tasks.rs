//! Task command handlers.

use anyhow::{Context, Result};
use chrono::Local;
use taskdeck_core::config::Config;
use taskdeck_core::tasks::Task;

use super::Backend;

pub async fn list(config: &Config) -> Result<()> {
    let backend = Backend::connect(config)?;
    let identity = backend.identity().await?;
    let tasks = backend.repo.list_tasks(&identity).await?;
    if tasks.is_empty() {
        println!("No tasks yet.");
    } else {
        for task in &tasks {
            println!("{}", format_task(task));
        }
    }
    Ok(())
}

pub async fn add(config: &Config, title: &str) -> Result<()> {
    let backend = Backend::connect(config)?;
    let identity = backend.identity().await?;
    let task = backend.repo.create_task(&identity, title).await?;
    println!("Added task {}: {}", task.id, task.title);
    Ok(())
}

pub async fn toggle(config: &Config, id: &str) -> Result<()> {
    let backend = Backend::connect(config)?;
    let identity = backend.identity().await?;
    let tasks = backend.repo.list_tasks(&identity).await?;
    let task = tasks
        .iter()
        .find(|t| t.id == id)
        .with_context(|| format!("Task not found: {id}"))?;

    backend
        .repo
        .toggle_task(&identity, &task.id, task.completed)
        .await?;
    let state = if task.completed { "not done" } else { "done" };
    println!("Marked {} as {state}", task.id);
    Ok(())
}

pub async fn delete(config: &Config, id: &str) -> Result<()> {
    let backend = Backend::connect(config)?;
    let identity = backend.identity().await?;
    backend.repo.delete_task(&identity, id).await?;
    println!("Deleted task {id}");
    Ok(())
}

fn format_task(task: &Task) -> String {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    let created = task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    format!("{mark} {}  {}  {created}", task.id, task.title)
}
