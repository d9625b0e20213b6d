//! Tokio event loop around the orchestrator.
//!
//! This module provides [`SessionRunner`], which owns the [`Orchestrator`]
//! and drains a single unbounded queue of [`SessionEvent`]s, and
//! [`TokioScheduler`], the timer service backed by `tokio::time`.
//!
//! Collaborator implementations get an [`EventSender`] and post their
//! completions into the queue, so every handler runs on the runner's task
//! one event at a time. The runner stops when the orchestrator has been shut
//! down, or when every [`EventSender`] has been dropped.

use std::collections::HashMap;
use std::time::Duration;

use helm_types::TimerId;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::event::SessionEvent;
use crate::orchestrator::Orchestrator;
use crate::ports::Scheduler;

/// Shortest period accepted by the scheduler; `tokio::time::interval`
/// rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Create the session event queue.
pub fn channel() -> (EventSender, UnboundedReceiver<SessionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

/// Posts events into the session queue.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: UnboundedSender<SessionEvent>,
}

impl EventSender {
    /// Queue `event`. Events sent after the runner has stopped are dropped.
    pub fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("session queue closed, dropping event");
        }
    }

    /// Return `true` once the runner has stopped receiving.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn downgrade(&self) -> WeakUnboundedSender<SessionEvent> {
        self.tx.downgrade()
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// [`Scheduler`] backed by spawned `tokio::time` tasks.
///
/// Timer tasks hold only a weak handle on the queue, so pending timers never
/// keep the runner alive. Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioScheduler {
    events: WeakUnboundedSender<SessionEvent>,
    next: TimerId,
    tasks: HashMap<TimerId, AbortHandle>,
}

impl TokioScheduler {
    /// Create a scheduler posting fires through `sender`.
    pub fn new(sender: &EventSender) -> Self {
        Self {
            events: sender.downgrade(),
            next: TimerId::default(),
            tasks: HashMap::new(),
        }
    }

    /// Number of timers that have not finished or been cancelled.
    pub fn active(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }

    fn allocate(&mut self) -> TimerId {
        self.tasks.retain(|_, handle| !handle.is_finished());
        self.next = self.next.next();
        self.next
    }
}

impl Scheduler for TokioScheduler {
    fn start_interval(&mut self, period: Duration) -> TimerId {
        let id = self.allocate();
        let events = self.events.clone();
        let period = period.max(MIN_PERIOD);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(tx) = events.upgrade() else { break };
                if tx.send(SessionEvent::Timer(id)).is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(id, task.abort_handle());
        id
    }

    fn start_timeout(&mut self, after: Duration) -> TimerId {
        let id = self.allocate();
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(tx) = events.upgrade() {
                let _ = tx.send(SessionEvent::Timer(id));
            }
        });
        self.tasks.insert(id, task.abort_handle());
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.tasks.remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for handle in self.tasks.values() {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Why the runner stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The orchestrator processed a shutdown.
    Shutdown,
    /// Every [`EventSender`] was dropped.
    ChannelClosed,
}

/// Result of a session run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Events dispatched to the orchestrator.
    pub events: u64,
    /// Why the run ended.
    pub reason: EndReason,
}

/// Owns the orchestrator and feeds it queued events.
#[derive(Debug)]
pub struct SessionRunner {
    orchestrator: Orchestrator,
    events: UnboundedReceiver<SessionEvent>,
}

impl SessionRunner {
    /// Create a runner draining `events` into `orchestrator`.
    pub const fn new(orchestrator: Orchestrator, events: UnboundedReceiver<SessionEvent>) -> Self {
        Self {
            orchestrator,
            events,
        }
    }

    /// The orchestrator, for inspection between or after runs.
    pub const fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Start the session and dispatch events until it ends.
    pub async fn run(&mut self) -> RunSummary {
        info!("session runner starting");
        self.orchestrator.start();

        let mut events: u64 = 0;
        let reason = loop {
            if self.orchestrator.is_terminated() {
                break EndReason::Shutdown;
            }
            let Some(event) = self.events.recv().await else {
                break EndReason::ChannelClosed;
            };
            self.orchestrator.dispatch(event);
            events = events.saturating_add(1);
        };

        self.events.close();
        let summary = RunSummary { events, reason };
        info!(events = summary.events, reason = ?summary.reason, "session runner stopped");
        summary
    }
}
