//! Task repository and the in-memory task list.
//!
//! Every call takes the caller's `Identity` explicitly; row ownership is
//! additionally enforced by the backend's row-level policy.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::backend::{BackendClient, TableQuery};
use crate::session::Identity;

/// Message for titles that are empty after trimming.
pub const EMPTY_TITLE: &str = "Task title cannot be empty";

/// A to-do item owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Backend-assigned, opaque. Numeric keys are kept in decimal form.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Insert payload. `id` and `created_at` are assigned by the backend.
#[derive(Debug, Clone, Serialize)]
struct NewTask<'a> {
    title: &'a str,
    completed: bool,
    user_id: &'a str,
}

/// Trims a title, rejecting one that ends up empty.
pub fn validate_title(title: &str) -> Result<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        anyhow::bail!(EMPTY_TITLE);
    }
    Ok(trimmed)
}

/// Reads and writes tasks in the backend table.
#[derive(Debug, Clone)]
pub struct TaskRepository {
    client: BackendClient,
    table: String,
}

impl TaskRepository {
    pub fn new(client: BackendClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// All tasks of the user, newest first.
    pub async fn list_tasks(&self, identity: &Identity) -> Result<Vec<Task>> {
        let query = TableQuery::table(&self.table)
            .select("*")
            .eq("user_id", &identity.user_id)
            .order("created_at", false);
        let tasks: Vec<Task> = self
            .client
            .select(&query, &identity.access_token)
            .await
            .context("Failed to fetch tasks")?;
        tracing::debug!(user_id = %identity.user_id, count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    /// Creates an incomplete task and returns the stored row.
    pub async fn create_task(&self, identity: &Identity, title: &str) -> Result<Task> {
        let title = validate_title(title)?;
        let query = TableQuery::table(&self.table).select("*").single();
        let body = [NewTask {
            title,
            completed: false,
            user_id: &identity.user_id,
        }];
        let task: Task = self
            .client
            .insert(&query, &identity.access_token, &body)
            .await
            .context("Failed to add task")?;
        tracing::debug!(task_id = %task.id, "created task");
        Ok(task)
    }

    /// Sets the completion flag of a task.
    pub async fn set_completed(&self, identity: &Identity, id: &str, completed: bool) -> Result<()> {
        let query = TableQuery::table(&self.table)
            .eq("id", id)
            .eq("user_id", &identity.user_id);
        self.client
            .update(&query, &identity.access_token, &json!({ "completed": completed }))
            .await
            .context("Failed to update task")?;
        tracing::debug!(task_id = id, completed, "updated task");
        Ok(())
    }

    /// Flips a task's completion flag given its current value.
    ///
    /// Concurrent toggles from several clients are last-write-wins.
    pub async fn toggle_task(&self, identity: &Identity, id: &str, completed: bool) -> Result<()> {
        self.set_completed(identity, id, !completed).await
    }

    /// Deletes a task. Deleting an already-removed task succeeds.
    pub async fn delete_task(&self, identity: &Identity, id: &str) -> Result<()> {
        let query = TableQuery::table(&self.table)
            .eq("id", id)
            .eq("user_id", &identity.user_id);
        self.client
            .delete(&query, &identity.access_token)
            .await
            .context("Failed to delete task")?;
        tracing::debug!(task_id = id, "deleted task");
        Ok(())
    }
}

/// Displayed task list, kept in `created_at` descending order.
///
/// Mutations mirror successful remote operations; ids are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    items: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the content with a fetched list.
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.items = tasks;
    }

    /// Inserts a newly created task at the head, exactly once.
    pub fn prepend(&mut self, task: Task) {
        self.items.retain(|t| t.id != task.id);
        self.items.insert(0, task);
    }

    /// Records the completion flag the backend now holds for `id`.
    /// Returns false if absent.
    pub fn set_completed(&mut self, id: &str, completed: bool) -> bool {
        match self.items.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.completed = completed;
                true
            }
            None => false,
        }
    }

    /// Removes `id`. Returns false if absent.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|t| t.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.items.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.items.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
