//! Event loop around a [`RoutineController`].
//!
//! The session is the single place routine state is mutated once a
//! front-end is running. Commands arrive over a channel, ticks come from
//! at most one live [`Ticker`], and every resulting [`Event`] is forwarded
//! to the subscriber.
//!
//! After each command or tick the ticker is reconciled with the timer:
//! it exists only while the engine is `Running`, and a ticker that belongs
//! to an earlier run is cancelled before the replacement is spawned.

use std::future::pending;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::events::Event;
use crate::routine::{RoutineController, TaskId};
use crate::storage::KeyValueStore;
use crate::timer::Ticker;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum SessionCommand {
    Toggle(TaskId),
    StartTimer(TaskId),
    PauseTimer,
    ResumeTimer,
    ResetTimer,
    ResetRoutine,
    Snapshot(oneshot::Sender<Event>),
    Shutdown,
}

pub struct Session<S> {
    controller: RoutineController<S>,
    ticker: Option<Ticker>,
    tick_period: Duration,
}

impl<S: KeyValueStore + 'static> Session<S> {
    pub fn new(controller: RoutineController<S>) -> Self {
        Self::with_tick_period(controller, DEFAULT_TICK_PERIOD)
    }

    pub fn with_tick_period(controller: RoutineController<S>, tick_period: Duration) -> Self {
        Self {
            controller,
            ticker: None,
            tick_period,
        }
    }

    /// Spawn the session onto the current tokio runtime.
    ///
    /// The join handle yields the controller back once the session ends.
    pub fn spawn(self) -> (SessionHandle, JoinHandle<RoutineController<S>>) {
        let (commands_tx, commands_rx) = mpsc::channel(32);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let join = tokio::spawn(self.run(commands_rx, events_tx));
        (
            SessionHandle {
                commands: commands_tx,
                events: events_rx,
            },
            join,
        )
    }

    /// Process commands and ticks until `Shutdown` or until every command
    /// sender is gone.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        events: mpsc::UnboundedSender<Event>,
    ) -> RoutineController<S> {
        loop {
            self.reconcile_ticker();

            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(SessionCommand::Shutdown) => break,
                    Some(command) => {
                        let produced = self.handle(command);
                        forward(&events, produced);
                    }
                },
                Some(()) = next_tick(&mut self.ticker) => {
                    let produced = self.controller.tick();
                    forward(&events, produced);
                }
            }
        }

        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        debug!("Session ended");
        self.controller
    }

    pub fn controller(&self) -> &RoutineController<S> {
        &self.controller
    }

    fn handle(&mut self, command: SessionCommand) -> Vec<Event> {
        let c = &mut self.controller;
        match command {
            SessionCommand::Toggle(id) => c.toggle_task(id),
            SessionCommand::StartTimer(id) => c.start_timer(id),
            SessionCommand::PauseTimer => c.pause_timer(),
            SessionCommand::ResumeTimer => c.resume_timer(),
            SessionCommand::ResetTimer => c.reset_timer(),
            SessionCommand::ResetRoutine => c.reset_routine(),
            SessionCommand::Snapshot(reply) => {
                let events: Vec<Event> = c.refresh_day().into_iter().collect();
                let _ = reply.send(c.snapshot());
                events
            }
            SessionCommand::Shutdown => Vec::new(),
        }
    }

    /// Keep exactly one ticker alive per running timer, none otherwise.
    fn reconcile_ticker(&mut self) {
        let timer = self.controller.timer();
        let wanted = timer.is_running().then(|| timer.run_id());

        let current = self.ticker.as_ref().map(Ticker::run_id);
        if current == wanted {
            return;
        }
        // Tear down the old stream before any new one exists.
        if let Some(old) = self.ticker.take() {
            old.cancel();
        }
        if let Some(run_id) = wanted {
            self.ticker = Some(Ticker::spawn(run_id, self.tick_period));
        }
    }
}

async fn next_tick(ticker: &mut Option<Ticker>) -> Option<()> {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => pending().await,
    }
}

fn forward(events: &mpsc::UnboundedSender<Event>, produced: Vec<Event>) {
    for event in produced {
        // A subscriber that went away just stops receiving.
        let _ = events.send(event);
    }
}

/// Front-end side of a spawned [`Session`].
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: mpsc::UnboundedReceiver<Event>,
}

impl SessionHandle {
    /// Send a command. Returns `false` if the session has ended.
    pub async fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn toggle(&self, id: TaskId) -> bool {
        self.send(SessionCommand::Toggle(id)).await
    }

    pub async fn start_timer(&self, id: TaskId) -> bool {
        self.send(SessionCommand::StartTimer(id)).await
    }

    pub async fn reset_timer(&self) -> bool {
        self.send(SessionCommand::ResetTimer).await
    }

    pub async fn reset_routine(&self) -> bool {
        self.send(SessionCommand::ResetRoutine).await
    }

    /// Current state, `None` if the session has ended.
    pub async fn snapshot(&self) -> Option<Event> {
        let (tx, rx) = oneshot::channel();
        if !self.send(SessionCommand::Snapshot(tx)).await {
            return None;
        }
        rx.await.ok()
    }

    pub async fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown).await;
    }

    /// Next event produced by the session.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Drain events already produced without waiting.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}
