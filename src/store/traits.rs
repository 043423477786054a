//! Persistence seam for workflow submissions.
//!
//! ## Rules
//! - Each method is atomic: either all of its writes land, or none do.
//! - `list_queued` orders by priority descending, ties broken
//!   oldest-first by creation time.
//! - `clone_for_restart` is a single transaction: the clone is created,
//!   the predecessor's active retention rules are inactivated, and the
//!   clone's rules are attached, or nothing happens at all.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::retention::RetentionRule;
use crate::submission::{WorkflowSpec, WorkflowStatus, WorkflowSubmission};

/// Durable state behind the admission loop.
///
/// Implementations are shared (`Arc<dyn SubmissionStore>`) between the
/// scheduler, the restart path, and whatever surface enqueues work.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Inserts a new submission. Fails if the id is already present.
    async fn insert(&self, submission: WorkflowSubmission) -> Result<(), ScheduleError>;

    /// Fetches a submission by id.
    async fn fetch(&self, id: Uuid) -> Result<WorkflowSubmission, ScheduleError>;

    /// Returns the current status without copying the whole record.
    async fn status(&self, id: Uuid) -> Result<WorkflowStatus, ScheduleError>;

    /// All submissions currently in [`WorkflowStatus::Queued`],
    /// priority descending, oldest first within a priority band.
    async fn list_queued(&self) -> Result<Vec<WorkflowSubmission>, ScheduleError>;

    /// Transitions a submission into [`WorkflowStatus::Queued`].
    async fn mark_queued(&self, id: Uuid) -> Result<(), ScheduleError>;

    /// Stores the computed complexity, priority, and minimum job memory
    /// in one write.
    async fn set_estimates(
        &self,
        id: Uuid,
        complexity: crate::cluster::Complexity,
        priority: i32,
        min_job_memory: u64,
    ) -> Result<(), ScheduleError>;

    /// Transitions a submission into [`WorkflowStatus::Running`].
    async fn mark_admitted(&self, id: Uuid) -> Result<(), ScheduleError>;

    /// Transitions a submission into [`WorkflowStatus::Failed`] and
    /// records the reason.
    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<(), ScheduleError>;

    /// Replaces the retention rules attached to a submission.
    async fn set_retention_rules(
        &self,
        id: Uuid,
        rules: Vec<RetentionRule>,
    ) -> Result<(), ScheduleError>;

    /// Retention rules attached to a submission, in insertion order.
    async fn retention_rules(&self, id: Uuid) -> Result<Vec<RetentionRule>, ScheduleError>;

    /// Atomically clones `original_id` for a restart.
    ///
    /// The clone keeps the original's owner, kind, workspace path, and
    /// run number, carries `spec` and `parameters`, starts in
    /// [`WorkflowStatus::Created`] with the restart flag set, and gets
    /// `rules` attached. The predecessor's active rules are inactivated
    /// in the same transaction. On any failure no state changes.
    async fn clone_for_restart(
        &self,
        original_id: Uuid,
        spec: WorkflowSpec,
        parameters: serde_json::Value,
        rules: Vec<RetentionRule>,
    ) -> Result<WorkflowSubmission, ScheduleError>;
}
