//! Stream consumption: one subscription per subject-name session.
//!
//! The replay loop is deliberately a strictly sequential per-event
//! lookup-then-fold loop: event *i*'s classification, delta resolution,
//! and fold all complete before event *i + 1* is pulled from the stream.
//! Per-event lookups may fan out internally (see the delta computer), but
//! no cross-event concurrency exists — that is what makes `snapshots[i]`
//! well-defined.
//!
//! [`HistorySession`] runs the loop on a spawned task and exposes a
//! live-growing [`SessionState`]. Cancellation aborts the task at its next
//! await point; in-flight lookups of the abandoned session are discarded
//! and never touch its timeline.

use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};

use crate::classify::ClassifiedEvent;
use crate::delta::{DeltaComputer, Resolver};
use crate::event::RawEvent;
use crate::model::{FoldMode, StateDelta};
use crate::timeline::Timeline;

/// Error from the upstream event supplier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Subscribing to the supplier failed outright.
    #[error("event supplier failed for '{name}': {reason}")]
    Subscribe {
        /// The subject name being subscribed.
        name: String,
        /// Supplier-reported reason.
        reason: String,
    },

    /// The stream failed mid-sequence. Folding stops at the last applied
    /// event; the partial timeline stays valid.
    #[error("event stream interrupted: {0}")]
    Interrupted(String),
}

/// A lazy, finite, cancelable sequence of raw events for one subscription.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<RawEvent, StreamError>> + Send>>;

/// Upstream event supplier: yields the raw event sequence for a subject
/// name, one fresh stream per subscription.
#[async_trait]
pub trait EventSupplier: Send + Sync {
    /// Open a new event stream for `name`.
    async fn subscribe(&self, name: &str) -> Result<EventStream, StreamError>;
}

/// Terminal loading state of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
    /// Still consuming the stream. A stream that never completes leaves
    /// the session here forever — observable, and not an error.
    #[default]
    Loading,
    /// The stream completed normally.
    Complete,
    /// The stream failed; the message is surfaced exactly once.
    Failed(String),
}

impl LoadStatus {
    /// True once the stream has completed or failed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// Observable state of one subject-name session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// The subject name this session reconstructs.
    pub name: String,
    /// The live-growing fold sequence.
    pub timeline: Timeline,
    /// Loading / terminal state.
    pub status: LoadStatus,
}

/// Pull events off the stream one at a time: classify, resolve the delta,
/// sanitize, and hand everything to `apply` (which folds). Returns the
/// stream's terminal outcome.
async fn drive<R, F>(
    mut stream: EventStream,
    computer: &DeltaComputer<R>,
    mut apply: F,
) -> Result<(), StreamError>
where
    R: Resolver,
    F: FnMut(ClassifiedEvent, StateDelta, FoldMode),
{
    while let Some(item) = stream.next().await {
        let raw = item?;
        let classified = ClassifiedEvent::from_event(raw);
        let mode = FoldMode::for_kind(classified.event.kind());
        let delta = computer.compute(&classified.event).await.sanitize();
        tracing::debug!(
            tx_id = %classified.tx_id,
            action = classified.action,
            "event folded"
        );
        apply(classified, delta, mode);
    }
    Ok(())
}

/// One-shot replay of an already-opened stream into a fresh [`Timeline`].
///
/// On a mid-stream failure the partial timeline up to the last applied
/// event is returned together with the error.
pub async fn replay<R: Resolver>(
    stream: EventStream,
    computer: &DeltaComputer<R>,
) -> (Timeline, Option<StreamError>) {
    let mut timeline = Timeline::new();
    let outcome = drive(stream, computer, |event, delta, mode| {
        timeline.apply(event, &delta, mode);
    })
    .await;
    (timeline, outcome.err())
}

/// A live subject-name session: subscribes once, folds on a background
/// task, and exposes the growing timeline.
///
/// Dropping the session (or calling [`cancel`](Self::cancel)) aborts the
/// task; the abandoned timeline is never touched again.
pub struct HistorySession {
    state: Arc<Mutex<SessionState>>,
    task: tokio::task::JoinHandle<()>,
}

impl HistorySession {
    /// Subscribe to `name` and start folding.
    #[must_use]
    pub fn start<S, R>(supplier: Arc<S>, computer: DeltaComputer<R>, name: &str) -> Self
    where
        S: EventSupplier + 'static,
        R: Resolver + 'static,
    {
        let state = Arc::new(Mutex::new(SessionState {
            name: name.to_string(),
            ..SessionState::default()
        }));
        let shared = Arc::clone(&state);
        let name = name.to_string();

        let task = tokio::spawn(async move {
            let stream = match supplier.subscribe(&name).await {
                Ok(stream) => stream,
                Err(err) => {
                    tracing::warn!(name = %name, error = %err, "subscription failed");
                    set_status(&shared, LoadStatus::Failed(err.to_string()));
                    return;
                }
            };

            let fold_state = Arc::clone(&shared);
            let outcome = drive(stream, &computer, move |event, delta, mode| {
                lock(&fold_state).timeline.apply(event, &delta, mode);
            })
            .await;

            match outcome {
                Ok(()) => set_status(&shared, LoadStatus::Complete),
                Err(err) => {
                    tracing::warn!(name = %name, error = %err, "stream failed mid-sequence");
                    set_status(&shared, LoadStatus::Failed(err.to_string()));
                }
            }
        });

        Self { state, task }
    }

    /// A point-in-time copy of the session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        lock(&self.state).clone()
    }

    /// Stop consuming the stream. Idempotent; also runs on drop.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// True once the background task has stopped (completed, failed, or
    /// canceled).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for HistorySession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn lock(state: &Arc<Mutex<SessionState>>) -> std::sync::MutexGuard<'_, SessionState> {
    // A poisoned lock means a panicked fold; the state itself is still
    // structurally sound (apply is append-only), so keep serving it.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn set_status(state: &Arc<Mutex<SessionState>>, status: LoadStatus) {
    lock(state).status = status;
}
