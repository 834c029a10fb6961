//! Shared building blocks used across feature slices.

pub mod input;
pub mod job;
pub mod text;

pub use input::LineInput;
pub use job::{JobCompleted, JobId, JobKind, JobSeq, JobStarted, JobState, Jobs};
