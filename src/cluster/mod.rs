//! Cluster contracts: live state, complexity estimation and the publish sink.
//!
//! The admission core never talks to a real cluster, estimator or message
//! queue directly; it consumes three seams, each an async trait implemented
//! by the embedder:
//!
//! - [`ReadinessProbe`] — snapshots live cluster capacity. A probe failure is
//!   treated as **not ready** (fail closed), never as an admission error.
//! - [`ComplexityEstimator`] — derives a [`Complexity`] metric from a
//!   workflow specification. Must be deterministic for identical input so
//!   retries never change a persisted complexity value.
//! - [`SubmissionPublisher`] — accepts admitted submissions for execution.
//!   Errors are transient and trigger the same requeue path as a not-ready
//!   cluster. The sink must be idempotent per workflow id: publication is
//!   at-least-once from the loop's perspective, though the loop never
//!   re-publishes after observing its own success.
//!
//! [`ClusterState`] snapshots are read-only and never cached beyond the
//! lifetime of one admission decision.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::submission::WorkflowSpec;

/// Live cluster capacity at one instant.
///
/// Supplied by a [`ReadinessProbe`]; consumed immediately and discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterState {
    /// Total cluster memory in bytes.
    pub total_memory: u64,
    /// Memory currently available for new work, in bytes.
    pub available_memory: u64,
    /// Number of currently running submissions.
    pub running: u64,
}

/// Estimated memory demand of one job in a workflow's DAG.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEstimate {
    /// Estimated peak memory of the job in bytes.
    pub memory: u64,
}

/// Structural/resource metric derived from a workflow specification.
///
/// Computed at most once per submission and persisted, so admission retries
/// never recompute it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complexity {
    jobs: Vec<JobEstimate>,
}

impl Complexity {
    /// Creates a complexity metric from per-job estimates.
    pub fn new(jobs: Vec<JobEstimate>) -> Self {
        Self { jobs }
    }

    /// Memory demand of the workflow's most demanding job, in bytes.
    ///
    /// This is the smallest per-job memory ceiling under which every job of
    /// the workflow can still run. `0` when the DAG is empty.
    pub fn peak_job_memory(&self) -> u64 {
        self.jobs.iter().map(|j| j.memory).max().unwrap_or(0)
    }

    /// Sum of all per-job memory estimates, in bytes.
    pub fn total_memory(&self) -> u64 {
        self.jobs.iter().map(|j| j.memory).sum()
    }

    /// Number of jobs in the estimated DAG.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}

/// Payload forwarded to the execution queue when a submission is admitted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdmittedSubmission {
    /// Tenant that owns the workflow.
    pub owner_id: Uuid,
    /// Workflow being started.
    pub workflow_id: Uuid,
    /// Caller-supplied execution parameters (opaque).
    pub parameters: Value,
    /// Scheduling priority; higher = scheduled sooner.
    pub priority: i32,
    /// Minimum per-job memory hint in bytes (`0` = none).
    pub min_job_memory: u64,
}

/// Snapshots live cluster capacity.
#[async_trait]
pub trait ReadinessProbe: Send + Sync + 'static {
    /// Returns the current cluster state.
    ///
    /// Errors mean the cluster-state source is unreachable; the scheduler
    /// treats that as "not ready" and requeues, it never fails the
    /// submission because of it.
    async fn snapshot(&self) -> Result<ClusterState, ScheduleError>;
}

/// Derives a complexity metric from a workflow specification.
#[async_trait]
pub trait ComplexityEstimator: Send + Sync + 'static {
    /// Estimates the complexity of the given specification.
    ///
    /// Must be a pure, deterministic function of `(kind, spec)`.
    async fn estimate(&self, kind: &str, spec: &WorkflowSpec) -> Result<Complexity, ScheduleError>;
}

/// Sink accepting admitted submissions for execution.
#[async_trait]
pub trait SubmissionPublisher: Send + Sync + 'static {
    /// Forwards one admitted submission to the execution queue.
    ///
    /// Errors are transient; the scheduler requeues the submission exactly as
    /// if the cluster had not been ready.
    async fn publish(&self, submission: &AdmittedSubmission) -> Result<(), ScheduleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_and_total_memory() {
        let c = Complexity::new(vec![
            JobEstimate { memory: 512 },
            JobEstimate { memory: 2048 },
            JobEstimate { memory: 1024 },
        ]);
        assert_eq!(c.peak_job_memory(), 2048);
        assert_eq!(c.total_memory(), 3584);
        assert_eq!(c.job_count(), 3);
    }

    #[test]
    fn empty_dag_has_no_demand() {
        let c = Complexity::new(vec![]);
        assert_eq!(c.peak_job_memory(), 0);
        assert_eq!(c.total_memory(), 0);
    }

    #[test]
    fn admitted_submission_serializes() {
        let sub = AdmittedSubmission {
            owner_id: Uuid::nil(),
            workflow_id: Uuid::nil(),
            parameters: serde_json::json!({"input": "data.csv"}),
            priority: 95,
            min_job_memory: 4096,
        };
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["priority"], 95);
        assert_eq!(json["min_job_memory"], 4096);
    }
}
