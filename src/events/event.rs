//! # Events emitted by the admission scheduler.
//!
//! The [`EventKind`] enum classifies event types across the admission
//! lifecycle (queued, attempt started, deferred, admitted, failed, cancelled)
//! plus estimation, quota and restart notifications. The [`Event`] struct
//! carries optional metadata such as the workflow id, attempt number, delay
//! and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of scheduler events.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A submission entered the admission queue.
    ///
    /// Sets: `workflow`, `at`, `seq`.
    SubmissionQueued,

    /// Complexity/priority estimation finished for a balanced submission.
    ///
    /// Sets: `workflow`, `reason` (rendered estimate), `at`, `seq`.
    EstimateComputed,

    /// An admission attempt is being evaluated.
    ///
    /// Sets: `workflow`, `attempt`, `at`, `seq`.
    AttemptStarted,

    /// The cluster was not ready (or the publish sink failed); the submission
    /// was requeued.
    ///
    /// Sets: `workflow`, `attempt`, `reason`, `delay_ms`, `at`, `seq`.
    AttemptDeferred,

    /// The submission was forwarded to the execution queue.
    ///
    /// Sets: `workflow`, `attempt`, `at`, `seq`.
    SubmissionAdmitted,

    /// The submission exhausted its attempts or failed validation.
    ///
    /// Sets: `workflow`, `attempt`, `reason`, `at`, `seq`.
    SubmissionFailed,

    /// The submission was stopped externally before admission.
    ///
    /// Sets: `workflow`, `attempt`, `at`, `seq`.
    SubmissionCancelled,

    /// A quota check rejected a guarded action.
    ///
    /// Sets: `workflow` (when known), `reason`, `at`, `seq`.
    QuotaRejected,

    /// A workflow was cloned for restart and its retention rules swapped.
    ///
    /// Sets: `workflow` (the clone id), `reason` (the predecessor id),
    /// `at`, `seq`.
    WorkflowRestarted,

    /// The scheduler loop observed cancellation and is shutting down.
    ///
    /// Sets: `at`, `seq`.
    ShutdownRequested,
}

/// Scheduler event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Workflow id, if applicable.
    pub workflow: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Requeue delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (deferral cause, failure detail, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            workflow: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a workflow id.
    #[inline]
    pub fn with_workflow(mut self, id: impl Into<Arc<str>>) -> Self {
        self.workflow = Some(id.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a requeue delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
