//! # Submission record and lifecycle states.
//!
//! [`WorkflowSubmission`] identifies one admission attempt: who owns it, what
//! should run, and the scheduling state computed for it. The record is owned
//! exclusively by the tenant that created it; the admission loop and quota
//! guard read and mutate it but never transfer ownership.
//!
//! ## Lifecycle
//! ```text
//! Created ──queue──► Queued ──admit──► Running-eligible
//!                      │
//!                      ├─ validation error ──► Failed
//!                      ├─ retry exhaustion ──► Failed
//!                      └─ external stop    ──► Stopped (loop reports Cancelled)
//! ```
//!
//! `complexity` is computed at most once per submission and persisted, so
//! admission retries never recompute it.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::cluster::Complexity;
use crate::submission::WorkflowSpec;

/// Persisted lifecycle status of a workflow submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowStatus {
    /// Created by the caller; not yet queued for admission.
    Created,
    /// Waiting in the admission queue.
    Queued,
    /// Admitted and forwarded to the execution layer.
    Running,
    /// Failed validation or exhausted its admission attempts.
    Failed,
    /// Execution completed successfully (post-admission; tracked for lineage).
    Finished,
    /// Stopped by an external signal.
    Stopped,
    /// Deleted by its owner.
    Deleted,
}

impl WorkflowStatus {
    /// Whether the status is terminal for the admission loop.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkflowStatus::Created | WorkflowStatus::Queued)
    }
}

/// Terminal result of one pass through the admission loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// The submission was published to the execution queue.
    Admitted,
    /// The submission failed; `reason` distinguishes validation failures,
    /// "cluster busy" and "insufficient memory" exhaustion.
    Failed {
        /// Human-readable failure reason.
        reason: String,
    },
    /// An external stop arrived before admission; the loop stopped retrying.
    Cancelled,
}

/// One request to execute a workflow, tracked through admission.
#[derive(Clone, Debug)]
pub struct WorkflowSubmission {
    /// Opaque unique workflow id.
    pub id: Uuid,
    /// Tenant that owns the submission.
    pub owner_id: Uuid,
    /// The workflow specification document.
    pub spec: WorkflowSpec,
    /// Workflow engine kind (e.g. `"serial"`, `"cwl"`, `"snakemake"`).
    pub kind: String,
    /// Caller-supplied execution parameters (opaque key/value document).
    pub parameters: Value,
    /// Current lifecycle status.
    pub status: WorkflowStatus,
    /// Complexity metric; `None` until estimated, then persisted.
    pub complexity: Option<Complexity>,
    /// Scheduling priority; higher = scheduled sooner.
    pub priority: i32,
    /// Minimum per-job memory hint in bytes (`0` = none).
    pub min_job_memory: u64,
    /// Shared workspace path (restart clones reuse the original's).
    pub workspace_path: String,
    /// Run-number lineage; restarts keep the predecessor's run number.
    pub run_number: u32,
    /// Whether this record is a restart clone.
    pub restart: bool,
    /// When the submission was created.
    pub created_at: DateTime<Utc>,
}

impl WorkflowSubmission {
    /// Creates a fresh submission in `Created` state.
    pub fn new(owner_id: Uuid, kind: impl Into<String>, spec: WorkflowSpec) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            owner_id,
            spec,
            kind: kind.into(),
            parameters: Value::Null,
            status: WorkflowStatus::Created,
            complexity: None,
            priority: 0,
            min_job_memory: 0,
            workspace_path: format!("users/{owner_id}/workflows/{id}"),
            run_number: 1,
            restart: false,
            created_at: Utc::now(),
        }
    }

    /// Sets execution parameters.
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// How long the submission has been waiting since creation.
    pub fn waited(&self, now: DateTime<Utc>) -> std::time::Duration {
        (now - self.created_at)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }
}
