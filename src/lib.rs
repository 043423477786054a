//! # flowgate
//!
//! **Flowgate** is an admission-control library for workflow platforms.
//!
//! It decides *when* a submitted workflow may enter the execution queue:
//! it estimates complexity, computes a scheduling priority, gates tenants
//! against resource quotas, resolves workspace retention rules, and retries
//! admission against live cluster capacity until the workflow is published
//! or fails. The crate is a building block for workflow servers; execution
//! itself stays behind the [`SubmissionPublisher`] seam.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌────────────────────┐  ┌────────────────────┐  ┌────────────────────┐
//!   │ WorkflowSubmission │  │ WorkflowSubmission │  │ WorkflowSubmission │
//!   └─────────┬──────────┘  └─────────┬──────────┘  └─────────┬──────────┘
//!             ▼                       ▼                       ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  AdmissionScheduler                                                 │
//! │  - SchedulingPolicy (fifo | balanced)                               │
//! │  - PriorityCalculator (memory footprint + wait bonus)               │
//! │  - QuotaGuard (per-tenant disk/cpu gate)                            │
//! │  - retention rule resolution (validated globs + universal default)  │
//! │  - Bus (broadcast events)                                           │
//! └───────┬────────────────────┬────────────────────┬───────────────────┘
//!         │ estimate           │ snapshot           │ publish
//!         ▼                    ▼                    ▼
//!  ComplexityEstimator   ReadinessProbe    SubmissionPublisher
//!  (workflow engine)     (cluster state)   (execution queue)
//!         │                    │                    │
//!         └────────────────────┴────────────────────┘
//!                              ▼
//!                      SubmissionStore
//!               (persisted status, estimates,
//!                retention rules, restart lineage)
//! ```
//!
//! ### Admission lifecycle
//! ```text
//! submit(submission)
//!   ├─► balanced? ─► estimate complexity once, persist priority
//!   ├─► quota gate: tenant at a limit ─► Failed (actionable report)
//!   ├─► resolve retention rules (all-or-nothing) ─► attach + default rule
//!   └─► status = Queued, publish SubmissionQueued
//!
//! admit(id) / run()
//! loop {
//!   ├─► status left Queued? ─► Cancelled, exit
//!   ├─► attempt += 1, publish AttemptStarted
//!   ├─► probe.snapshot()
//!   │     ├─ Err          ─► defer (fail-closed, never fatal)
//!   │     ├─ busy         ─► defer: ClusterBusy
//!   │     ├─ low memory   ─► defer: InsufficientMemory
//!   │     └─ ready        ─► publish to execution queue
//!   │           ├─ Err    ─► defer (sink hiccup, same path)
//!   │           └─ Ok     ─► status = Running, Admitted, exit
//!   ├─► attempts exhausted ─► Failed{ last deferral reason }, exit
//!   └─► sleep(requeue_delay) (cancellable), continue
//! }
//! ```
//!
//! ## Features
//! | Area           | Description                                                   | Key types / traits                              |
//! |----------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Scheduling** | Policy selection, priority and readiness checks.              | [`SchedulingPolicy`], [`PriorityCalculator`], [`CheckLevel`] |
//! | **Admission**  | Queue, retry and publish submissions.                         | [`AdmissionScheduler`], [`AdmissionOutcome`]    |
//! | **Quotas**     | Per-tenant disk/cpu limits with race-free commits.            | [`QuotaGuard`], [`QuotaStore`], [`QuotaPermit`] |
//! | **Retention**  | Validated workspace retention rules with a universal default. | [`RetentionRule`], [`resolve_rules`]            |
//! | **Restart**    | Atomic clone of a finished workflow under a new spec.         | [`AdmissionScheduler::restart`]                 |
//! | **Events**     | Broadcast lifecycle notifications.                            | [`Bus`], [`Event`], [`EventKind`]               |
//! | **Errors**     | Typed errors with retryability and stable labels.             | [`ScheduleError`]                               |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use uuid::Uuid;
//! use flowgate::{
//!     AdmissionScheduler, AdmittedSubmission, ClusterState, Complexity, ComplexityEstimator,
//!     Config, JobEstimate, MemoryStore, QuotaRecord, QuotaStore, ReadinessProbe, ResourceKind,
//!     ScheduleError, SubmissionPublisher, WorkflowSpec, WorkflowSubmission,
//! };
//!
//! struct Probe;
//! #[async_trait::async_trait]
//! impl ReadinessProbe for Probe {
//!     async fn snapshot(&self) -> Result<ClusterState, ScheduleError> {
//!         Ok(ClusterState {
//!             total_memory: 8 << 30,
//!             available_memory: 6 << 30,
//!             running: 0,
//!         })
//!     }
//! }
//!
//! struct Estimator;
//! #[async_trait::async_trait]
//! impl ComplexityEstimator for Estimator {
//!     async fn estimate(
//!         &self,
//!         _kind: &str,
//!         _spec: &WorkflowSpec,
//!     ) -> Result<Complexity, ScheduleError> {
//!         Ok(Complexity::new(vec![JobEstimate { memory: 2 << 30 }]))
//!     }
//! }
//!
//! struct Publisher;
//! #[async_trait::async_trait]
//! impl SubmissionPublisher for Publisher {
//!     async fn publish(&self, submission: &AdmittedSubmission) -> Result<(), ScheduleError> {
//!         println!("admitted workflow {}", submission.workflow_id);
//!         Ok(())
//!     }
//! }
//!
//! struct Quotas;
//! #[async_trait::async_trait]
//! impl QuotaStore for Quotas {
//!     async fn record(
//!         &self,
//!         _owner: Uuid,
//!         _kind: ResourceKind,
//!     ) -> Result<QuotaRecord, ScheduleError> {
//!         Ok(QuotaRecord::default())
//!     }
//!     async fn add_usage(
//!         &self,
//!         _owner: Uuid,
//!         _kind: ResourceKind,
//!         _bytes: u64,
//!     ) -> Result<(), ScheduleError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.scheduling_policy = "balanced".to_string();
//!
//!     let scheduler = AdmissionScheduler::new(
//!         cfg,
//!         MemoryStore::new(),
//!         Arc::new(Probe),
//!         Arc::new(Estimator),
//!         Arc::new(Publisher),
//!         Arc::new(Quotas),
//!     )?;
//!
//!     let submission = WorkflowSubmission::new(Uuid::new_v4(), "serial", WorkflowSpec::empty());
//!     let id = scheduler.submit(submission).await?;
//!     let outcome = scheduler.admit(id, &CancellationToken::new()).await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

mod cluster;
mod config;
mod core;
mod error;
mod events;
mod policies;
mod quota;
mod retention;
mod store;
mod submission;

// ---- Public re-exports ----

pub use cluster::{
    AdmittedSubmission, ClusterState, Complexity, ComplexityEstimator, JobEstimate,
    ReadinessProbe, SubmissionPublisher,
};
pub use config::{Config, DEFAULT_RETENTION_PATTERN};
pub use core::AdmissionScheduler;
pub use error::{ScheduleError, QUOTA_DOCS_URL};
pub use events::{Bus, Event, EventKind};
pub use policies::{CheckLevel, PriorityCalculator, PriorityEstimate, SchedulingPolicy};
pub use quota::{
    human_amount, human_bytes, QuotaGuard, QuotaPermit, QuotaRecord, QuotaStore, ResourceKind,
};
pub use retention::{resolve_rules, RetentionRule, RuleStatus};
pub use store::{MemoryStore, SubmissionStore};
pub use submission::{AdmissionOutcome, WorkflowSpec, WorkflowStatus, WorkflowSubmission};
