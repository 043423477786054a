//! # Global runtime configuration.
//!
//! Provides [`Config`], the explicitly constructed settings object passed to
//! every component at construction time. There is no hidden process-wide
//! state: embedders build one `Config` and hand it to the scheduler, the
//! priority calculator and the retention resolver.
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → no concurrency ceiling (the `concurrent`
//!   readiness check always passes)
//! - `cluster_job_memory_limit = 0` → no cluster-wide per-job memory limit
//! - `max_user_job_memory = 0` → no per-user per-job memory ceiling
//! - `requeue_delay = 0s` → re-evaluate immediately (useful in tests)
//!
//! Prefer the accessor helpers over sprinkling sentinel checks (`0`) across
//! the codebase.

use std::time::Duration;

/// Universal workspace pattern every workflow must carry a retention rule for.
pub const DEFAULT_RETENTION_PATTERN: &str = "**/*";

/// Global configuration for the admission runtime.
///
/// Defines:
/// - **Scheduling behavior**: policy name, readiness check level
/// - **Retry behavior**: requeue delay and attempt ceiling
/// - **Memory limits**: cluster-wide and per-user per-job ceilings
/// - **Retention defaults**: maximum retention days and universal pattern
/// - **Event system**: bus capacity for event delivery
#[derive(Clone, Debug)]
pub struct Config {
    /// Scheduling policy name: `"fifo"` or `"balanced"`.
    ///
    /// Validated by [`SchedulingPolicy::select`](crate::SchedulingPolicy::select)
    /// at first use; an unknown value is a fatal configuration error.
    pub scheduling_policy: String,

    /// Readiness check level: `0` (no checks), `1` (concurrent), `2` (memory),
    /// `9` (all checks).
    pub readiness_check_level: u8,

    /// Delay between admission attempts for a submission that is not yet
    /// admissible. `Duration::ZERO` re-evaluates immediately.
    pub requeue_delay: Duration,

    /// Maximum number of admission attempts before a submission is failed.
    ///
    /// Minimum effective value is 1; the loop always evaluates readiness at
    /// least once.
    pub max_attempts: u32,

    /// Maximum number of concurrently running submissions.
    ///
    /// `0` = unlimited; the `concurrent` readiness check passes
    /// unconditionally.
    pub max_concurrent: u64,

    /// Cluster-wide per-job memory limit in bytes (`0` = unset).
    ///
    /// A submission whose most demanding job needs more than this can never
    /// run anywhere in the cluster and is failed up front.
    pub cluster_job_memory_limit: u64,

    /// Per-user per-job memory ceiling in bytes (`0` = unset).
    pub max_user_job_memory: u64,

    /// Memory assumed for the `memory` readiness check when a submission has
    /// no per-job memory hint (`min_job_memory == 0`).
    pub default_job_memory: u64,

    /// Maximum (and synthetic-default) workspace retention period in days.
    pub max_retention_days: u32,

    /// Universal glob pattern for the synthetic default retention rule.
    pub default_retention_pattern: String,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events
    /// receive `Lagged` and skip older items. Minimum value is 1 (clamped by
    /// the bus).
    pub bus_capacity: usize,

    /// How long the scheduler loop sleeps when the queue is empty.
    pub idle_poll: Duration,
}

impl Config {
    /// Returns the concurrency ceiling as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` running submissions
    #[inline]
    pub fn concurrency_ceiling(&self) -> Option<u64> {
        if self.max_concurrent == 0 {
            None
        } else {
            Some(self.max_concurrent)
        }
    }

    /// Returns the cluster-wide per-job memory limit as an `Option`.
    #[inline]
    pub fn cluster_job_memory(&self) -> Option<u64> {
        if self.cluster_job_memory_limit == 0 {
            None
        } else {
            Some(self.cluster_job_memory_limit)
        }
    }

    /// Returns the per-user per-job memory ceiling as an `Option`.
    #[inline]
    pub fn user_job_memory(&self) -> Option<u64> {
        if self.max_user_job_memory == 0 {
            None
        } else {
            Some(self.max_user_job_memory)
        }
    }

    /// Returns the attempt ceiling, clamped to a minimum of 1.
    #[inline]
    pub fn attempt_ceiling(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `scheduling_policy = "fifo"` (start workflows as they come)
    /// - `readiness_check_level = 9` (all checks)
    /// - `requeue_delay = 15s`, `max_attempts = 200`
    /// - `max_concurrent = 30`
    /// - memory limits unset (`0`), `default_job_memory = 4 GiB`
    /// - `max_retention_days = 365`, universal pattern `**/*`
    /// - `bus_capacity = 1024`, `idle_poll = 5s`
    fn default() -> Self {
        Self {
            scheduling_policy: "fifo".to_string(),
            readiness_check_level: 9,
            requeue_delay: Duration::from_secs(15),
            max_attempts: 200,
            max_concurrent: 30,
            cluster_job_memory_limit: 0,
            max_user_job_memory: 0,
            default_job_memory: 4 * 1024 * 1024 * 1024,
            max_retention_days: 365,
            default_retention_pattern: DEFAULT_RETENTION_PATTERN.to_string(),
            bus_capacity: 1024,
            idle_poll: Duration::from_secs(5),
        }
    }
}
