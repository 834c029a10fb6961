//! Auth screen: email/password form for sign-in and sign-up.

mod render;
mod state;
mod update;

pub use render::render_auth_screen;
pub use state::{AuthField, AuthState};
pub use update::{handle_auth_result, handle_key};
