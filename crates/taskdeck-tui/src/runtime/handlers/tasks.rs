use taskdeck_core::backend::describe;
use taskdeck_core::session::Identity;
use taskdeck_core::tasks::TaskRepository;

use crate::events::{TasksUiEvent, UiEvent};

fn report(operation: &str, err: &anyhow::Error) -> String {
    tracing::warn!(operation, "Task operation failed: {err:#}");
    describe(err)
}

pub async fn fetch_tasks(repo: TaskRepository, identity: Identity) -> UiEvent {
    let result = repo
        .list_tasks(&identity)
        .await
        .map_err(|err| report("fetch", &err));
    UiEvent::Tasks(TasksUiEvent::Loaded {
        owner: identity.user_id,
        result,
    })
}

pub async fn create_task(repo: TaskRepository, identity: Identity, title: String) -> UiEvent {
    let result = repo
        .create_task(&identity, &title)
        .await
        .map_err(|err| report("create", &err));
    UiEvent::Tasks(TasksUiEvent::Created {
        owner: identity.user_id,
        result,
    })
}

pub async fn toggle_task(
    repo: TaskRepository,
    identity: Identity,
    id: String,
    completed: bool,
) -> UiEvent {
    let result = repo
        .toggle_task(&identity, &id, completed)
        .await
        .map_err(|err| report("toggle", &err));
    UiEvent::Tasks(TasksUiEvent::Toggled {
        owner: identity.user_id,
        id,
        completed: !completed,
        result,
    })
}

pub async fn delete_task(repo: TaskRepository, identity: Identity, id: String) -> UiEvent {
    let result = repo
        .delete_task(&identity, &id)
        .await
        .map_err(|err| report("delete", &err));
    UiEvent::Tasks(TasksUiEvent::Deleted {
        owner: identity.user_id,
        id,
        result,
    })
}
