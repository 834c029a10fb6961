//! Core library for taskdeck: configuration, logging, the hosted backend
//! client, the session store and the task repository.
//!
//! The terminal UI (`taskdeck-tui`) and the binary (`taskdeck`) build on top.

pub mod backend;
pub mod config;
pub mod logging;
pub mod session;
pub mod tasks;
