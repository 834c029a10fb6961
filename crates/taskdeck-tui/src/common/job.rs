//! Background job lifecycle.
//!
//! The runtime reports `JobStarted` once a job is spawned and `JobCompleted`
//! with the job's result event when it finishes. Only the reducer mutates
//! `JobState`; a completion whose id is no longer active is dropped, which
//! gives latest-only semantics when the same kind of job is issued twice.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

#[derive(Debug, Default)]
pub struct JobSeq {
    next: u64,
}

impl JobSeq {
    pub fn next_id(&mut self) -> JobId {
        let id = JobId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Startup session recovery.
    Restore,
    /// Sign-in, sign-up or sign-out; one at a time.
    Auth,
    /// Task list fetch.
    FetchTasks,
}

#[derive(Debug, Clone, Copy)]
pub struct JobStarted {
    pub id: JobId,
}

#[derive(Debug)]
pub struct JobCompleted<E> {
    pub id: JobId,
    pub result: E,
}

#[derive(Debug, Default, Clone)]
pub struct JobState {
    pub active: Option<JobId>,
}

impl JobState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn on_started(&mut self, started: JobStarted) {
        self.active = Some(started.id);
    }

    /// Clears the job if `id` is the active one. Returns whether it was.
    pub fn finish_if_active(&mut self, id: JobId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.active = None;
        }
        ok
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

#[derive(Debug, Default, Clone)]
pub struct Jobs {
    pub restore: JobState,
    pub auth: JobState,
    pub fetch_tasks: JobState,
}

impl Jobs {
    pub fn state_mut(&mut self, kind: JobKind) -> &mut JobState {
        match kind {
            JobKind::Restore => &mut self.restore,
            JobKind::Auth => &mut self.auth,
            JobKind::FetchTasks => &mut self.fetch_tasks,
        }
    }

    pub fn is_any_running(&self) -> bool {
        self.restore.is_running() || self.auth.is_running() || self.fetch_tasks.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_job_finishes() {
        let mut seq = JobSeq::default();
        let mut state = JobState::default();
        let first = seq.next_id();
        let second = seq.next_id();

        state.on_started(JobStarted { id: first });
        state.on_started(JobStarted { id: second });

        assert!(!state.finish_if_active(first));
        assert!(state.is_running());
        assert!(state.finish_if_active(second));
        assert!(!state.is_running());
    }

    #[test]
    fn cleared_job_rejects_completion() {
        let mut seq = JobSeq::default();
        let mut jobs = Jobs::default();
        let id = seq.next_id();
        jobs.state_mut(JobKind::FetchTasks).on_started(JobStarted { id });
        jobs.fetch_tasks.clear();

        assert!(!jobs.state_mut(JobKind::FetchTasks).finish_if_active(id));
        assert!(!jobs.is_any_running());
    }
}
