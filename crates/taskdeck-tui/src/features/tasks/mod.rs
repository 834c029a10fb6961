//! Task screen: title input, ordered list, toggle/delete/sign-out gestures.

mod render;
mod state;
mod update;

pub use render::{EMPTY_TEXT, LOADING_TEXT, render_task_screen};
pub use state::TasksState;
pub use update::{handle_key, handle_tasks_result};
