//! TUI runtime: owns the terminal, runs the event loop, executes effects.
//!
//! All side effects happen here. The reducer stays pure and produces
//! effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! - Handlers send `UiEvent`s to `inbox_tx`
//! - The runtime drains `inbox_rx` each frame
//! - Session transitions are drained from the store subscription the same way
//!
//! Structure:
//! - `mod.rs`: core runtime (`TuiRuntime`, event loop, effect dispatch)
//! - `inbox.rs`: inbox channel types
//! - `handlers/`: effect handler implementations

mod handlers;
mod inbox;

use std::future::Future;
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use inbox::{UiEventReceiver, UiEventSender};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use taskdeck_core::session::{SessionStore, SessionSubscription};
use taskdeck_core::tasks::TaskRepository;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::{JobCompleted, JobId, JobKind, JobStarted};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Tick interval while background work is running (spinner animation).
pub const FRAME_DURATION: Duration = Duration::from_millis(80);

/// Poll duration when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(250);

/// Full-screen TUI runtime.
///
/// Terminal state is restored on drop and on panic.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    store: Arc<SessionStore>,
    repo: TaskRepository,
    /// Live session listener; dropped (unsubscribed) with the runtime.
    session_events: Option<SessionSubscription>,
    /// Stops the background token refresh.
    shutdown: CancellationToken,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    last_tick: Instant,
}

impl TuiRuntime {
    /// Creates the runtime and takes over the terminal.
    pub fn new(store: Arc<SessionStore>, repo: TaskRepository) -> Result<Self> {
        // Set up panic hook BEFORE entering alternate screen
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let session_events = Some(store.subscribe());
        let shutdown = CancellationToken::new();
        store.spawn_auto_refresh(shutdown.clone());

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            state: AppState::new(),
            store,
            repo,
            session_events,
            shutdown,
            inbox_tx,
            inbox_rx,
            last_tick: Instant::now(),
        })
    }

    /// Runs the main event loop until the user quits.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;

        let effects = update::init(&mut self.state);
        self.execute_effects(effects);
        let result = self.event_loop();

        let _ = terminal::disable_input_features();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let events = self.collect_events()?;
            dirty |= !events.is_empty();
            for event in events {
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| render::render(&self.state, frame))?;
                dirty = false;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Event Collection
    // ========================================================================

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let tick_interval = if self.state.jobs.is_any_running() || self.state.session.restoring {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        self.collect_session_events(&mut events);
        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    fn collect_session_events(&mut self, events: &mut Vec<UiEvent>) {
        let Some(subscription) = self.session_events.as_mut() else {
            return;
        };
        while let Some(event) = subscription.try_recv() {
            events.push(UiEvent::Session(event));
        }
    }

    // ========================================================================
    // Effect Dispatch
    // ========================================================================

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns a handler and sends its result event to the inbox.
    fn spawn_effect<Fut>(&self, fut: Fut)
    where
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });
    }

    /// Spawns a handler with the uniform `JobStarted`/`JobCompleted` lifecycle.
    fn spawn_job<Fut>(&self, kind: JobKind, id: JobId, fut: Fut)
    where
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let _ = tx.send(UiEvent::JobStarted {
            kind,
            started: JobStarted { id },
        });
        tokio::spawn(async move {
            let completed = JobCompleted {
                id,
                result: Box::new(fut.await),
            };
            let _ = tx.send(UiEvent::JobCompleted { kind, completed });
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        let store = Arc::clone(&self.store);
        let repo = self.repo.clone();
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }

            // Session effects
            UiEffect::RestoreSession { job } => {
                self.spawn_job(JobKind::Restore, job, handlers::restore_session(store));
            }
            UiEffect::SignIn {
                job,
                email,
                password,
            } => {
                self.spawn_job(JobKind::Auth, job, handlers::sign_in(store, email, password));
            }
            UiEffect::SignUp {
                job,
                email,
                password,
            } => {
                self.spawn_job(JobKind::Auth, job, handlers::sign_up(store, email, password));
            }
            UiEffect::SignOut { job } => {
                self.spawn_job(JobKind::Auth, job, handlers::sign_out(store));
            }

            // Task effects
            UiEffect::FetchTasks { job, identity } => {
                self.spawn_job(
                    JobKind::FetchTasks,
                    job,
                    handlers::fetch_tasks(repo, identity),
                );
            }
            UiEffect::CreateTask { identity, title } => {
                self.spawn_effect(handlers::create_task(repo, identity, title));
            }
            UiEffect::ToggleTask {
                identity,
                id,
                completed,
            } => {
                self.spawn_effect(handlers::toggle_task(repo, identity, id, completed));
            }
            UiEffect::DeleteTask { identity, id } => {
                self.spawn_effect(handlers::delete_task(repo, identity, id));
            }
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        if let Some(subscription) = self.session_events.take() {
            subscription.unsubscribe();
        }
        self.shutdown.cancel();
        let _ = terminal::restore_terminal();
    }
}
