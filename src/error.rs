//! Error types used by the admission core.
//!
//! This module defines [`ScheduleError`], the single error enum covering the
//! whole admission pipeline. Variants fall into four groups:
//!
//! - **Configuration errors** (`InvalidPolicy`, `InvalidCheckLevel`) — operator
//!   mistakes, fatal at first use, never retried.
//! - **Validation errors** (`JobMemoryLimitExceeded`, `InvalidRetentionRule`) —
//!   rejected synchronously; the submission never enters the admission loop.
//! - **Transient conditions** (`ClusterBusy`, `InsufficientMemory`,
//!   `PublishFailed`) — retried up to the configured attempt ceiling.
//! - **Resource exhaustion** (`QuotaExceeded`) — rejected before any resource
//!   is committed; the message is user-visible and actionable.
//!
//! Helper methods (`as_label`, `is_retryable`) are provided for logging and
//! metrics, mirroring how the rest of the runtime classifies failures.

use thiserror::Error;

/// Pointer included in quota-excess messages so users know where to look.
pub const QUOTA_DOCS_URL: &str = "https://docs.example.org/advanced-usage/user-quotas";

/// Errors produced by the admission pipeline.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Unknown scheduling policy name in configuration.
    #[error("invalid scheduling policy {policy:?}; expected \"fifo\" or \"balanced\"")]
    InvalidPolicy {
        /// The rejected policy string.
        policy: String,
    },

    /// Unknown readiness check level in configuration.
    #[error("invalid readiness check level {level}; expected 0, 1, 2 or 9")]
    InvalidCheckLevel {
        /// The rejected numeric level.
        level: u8,
    },

    /// The submission's minimum per-job memory cannot be satisfied.
    #[error("minimum job memory {requested} exceeds the configured limit {limit}")]
    JobMemoryLimitExceeded {
        /// Bytes the workflow's most demanding job needs.
        requested: u64,
        /// The violated ceiling in bytes.
        limit: u64,
    },

    /// A workspace retention rule failed validation.
    #[error("invalid retention rule {pattern:?}: {reason}")]
    InvalidRetentionRule {
        /// The offending glob pattern.
        pattern: String,
        /// Why the rule was rejected.
        reason: String,
    },

    /// The action would push the tenant's usage over its quota limit.
    ///
    /// The rendered message is shown to users, not just logged.
    #[error(
        "{action} would exceed the {resource} quota limit ({}). \
         Currently used: {}. Aborting. Please see: {QUOTA_DOCS_URL}",
        crate::quota::human_amount(.resource, *.limit),
        crate::quota::human_amount(.resource, *.used),
    )]
    QuotaExceeded {
        /// Resource kind label (e.g. "disk").
        resource: &'static str,
        /// Configured limit, in the kind's unit.
        limit: u64,
        /// Current usage, in the kind's unit.
        used: u64,
        /// What was being attempted, e.g. "Uploading file x.root".
        action: String,
    },

    /// The cluster is running at its concurrency ceiling.
    #[error("cluster busy: {running} workflows running (ceiling {ceiling})")]
    ClusterBusy {
        /// Currently running submissions.
        running: u64,
        /// Configured concurrency ceiling.
        ceiling: u64,
    },

    /// Not enough free cluster memory for the submission's smallest viable job.
    #[error("insufficient cluster memory: need {needed}, {available} available")]
    InsufficientMemory {
        /// Bytes required by the submission.
        needed: u64,
        /// Bytes currently available.
        available: u64,
    },

    /// The cluster-state source could not be reached.
    ///
    /// Treated exactly like "not ready": the submission is requeued, never
    /// failed because of it.
    #[error("cluster state unavailable: {reason}")]
    ProbeUnavailable {
        /// Probe-provided failure detail.
        reason: String,
    },

    /// The execution-queue sink rejected or could not accept the submission.
    #[error("publishing submission failed: {reason}")]
    PublishFailed {
        /// Sink-provided failure detail.
        reason: String,
    },

    /// A persistence operation failed; prior state is left untouched.
    #[error("storage error: {reason}")]
    Storage {
        /// Store-provided failure detail.
        reason: String,
    },
}

impl ScheduleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ScheduleError::InvalidPolicy { .. } => "invalid_policy",
            ScheduleError::InvalidCheckLevel { .. } => "invalid_check_level",
            ScheduleError::JobMemoryLimitExceeded { .. } => "job_memory_limit_exceeded",
            ScheduleError::InvalidRetentionRule { .. } => "invalid_retention_rule",
            ScheduleError::QuotaExceeded { .. } => "quota_exceeded",
            ScheduleError::ClusterBusy { .. } => "cluster_busy",
            ScheduleError::InsufficientMemory { .. } => "insufficient_memory",
            ScheduleError::ProbeUnavailable { .. } => "probe_unavailable",
            ScheduleError::PublishFailed { .. } => "publish_failed",
            ScheduleError::Storage { .. } => "storage",
        }
    }

    /// Whether the admission loop may retry after this error.
    ///
    /// Only transient cluster conditions and publish-sink failures are
    /// retryable; configuration and validation errors surface immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScheduleError::ClusterBusy { .. }
                | ScheduleError::InsufficientMemory { .. }
                | ScheduleError::ProbeUnavailable { .. }
                | ScheduleError::PublishFailed { .. }
        )
    }
}
