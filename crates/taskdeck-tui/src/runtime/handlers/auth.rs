use std::sync::Arc;

use taskdeck_core::backend::describe;
use taskdeck_core::session::SessionStore;

use crate::events::{AuthUiEvent, UiEvent};

pub async fn restore_session(store: Arc<SessionStore>) -> UiEvent {
    UiEvent::SessionRestored(store.restore_session().await)
}

pub async fn sign_in(store: Arc<SessionStore>, email: String, password: String) -> UiEvent {
    let result = store.sign_in(&email, &password).await.map_err(|err| {
        tracing::info!("Sign-in failed: {err:#}");
        describe(&err)
    });
    UiEvent::Auth(AuthUiEvent::SignInFinished(result))
}

pub async fn sign_up(store: Arc<SessionStore>, email: String, password: String) -> UiEvent {
    let result = store.sign_up(&email, &password).await.map_err(|err| {
        tracing::info!("Sign-up failed: {err:#}");
        describe(&err)
    });
    UiEvent::Auth(AuthUiEvent::SignUpFinished(result))
}

pub async fn sign_out(store: Arc<SessionStore>) -> UiEvent {
    let result = store.sign_out().await.map_err(|err| {
        tracing::warn!("Sign-out failed: {err:#}");
        describe(&err)
    });
    UiEvent::Auth(AuthUiEvent::SignOutFinished(result))
}
