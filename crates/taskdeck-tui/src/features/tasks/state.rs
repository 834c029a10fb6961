use taskdeck_core::tasks::{Task, TaskList};

use crate::common::LineInput;

#[derive(Debug, Default)]
pub struct TasksState {
    pub list: TaskList,
    /// New task title.
    pub input: LineInput,
    /// Index of the highlighted task.
    pub selected: usize,
    /// A fetch for the current session has not completed yet.
    pub loading: bool,
}

impl TasksState {
    pub fn selected_task(&self) -> Option<&Task> {
        self.list.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.list.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keeps the selection inside the list after it shrank.
    pub fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.list.len().saturating_sub(1));
    }

    /// Discards everything scoped to the previous identity.
    pub fn reset(&mut self) {
        self.list.clear();
        self.input.clear();
        self.selected = 0;
        self.loading = false;
    }
}
