//! # Priority and memory-hint computation for balanced scheduling.
//!
//! [`PriorityCalculator`] combines a workflow's complexity estimate with the
//! live cluster-memory headroom into a [`PriorityEstimate`]: an integer
//! priority score (higher = scheduled sooner) plus a minimum per-job memory
//! hint forwarded to the execution layer.
//!
//! ## Score shape
//! The binding contract is monotonicity, not a particular formula:
//!
//! - the score **never increases** as the ratio of the workflow's peak job
//!   memory to total cluster memory grows (large workflows must not starve
//!   small ones);
//! - the score **never decreases** as the submission's wait time grows
//!   (every workflow is eventually admitted).
//!
//! The implementation uses
//! `round(100 · (1 − clamp(peak/total, 0, 1))) + min(wait_secs / 60, 100)`:
//! a memory share term in `[0, 100]` plus one aging point per minute waited,
//! capped so scores stay small and comparable.
//!
//! ## Memory hint
//! `min_job_memory` is derived purely from complexity — the smallest per-job
//! memory ceiling that still lets the workflow's most demanding job run. It
//! is validated against the administrator-configured ceilings and forwarded
//! as a scheduling hint, never enforced here.

use std::time::Duration;

use crate::cluster::Complexity;
use crate::config::Config;
use crate::error::ScheduleError;

/// Aging bonus cap: a submission stops accruing priority after this many
/// wait-minutes, keeping scores bounded.
const MAX_WAIT_BONUS: i32 = 100;

/// Scale of the memory-share term.
const MEMORY_SCORE_SCALE: f64 = 100.0;

/// Result of a balanced-policy priority computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriorityEstimate {
    /// Scheduling priority; higher values are scheduled sooner.
    pub priority: i32,
    /// Smallest per-job memory ceiling (bytes) that still lets the
    /// workflow's most demanding job run. `0` = no hint.
    pub min_job_memory: u64,
}

impl PriorityEstimate {
    /// The estimate used under fifo policy: no weighting, no memory hint.
    pub const NONE: PriorityEstimate = PriorityEstimate {
        priority: 0,
        min_job_memory: 0,
    };
}

/// Computes priority scores and memory hints for balanced submissions.
///
/// Construct once from [`Config`]; the calculator is cheap and `Copy`-free
/// state: just the two administrator-configured memory ceilings.
#[derive(Clone, Debug)]
pub struct PriorityCalculator {
    /// Per-user per-job memory ceiling (`None` = unset).
    max_user_job_memory: Option<u64>,
    /// Cluster-wide per-job memory limit (`None` = unset).
    cluster_job_memory_limit: Option<u64>,
}

impl PriorityCalculator {
    /// Creates a calculator from the configured memory ceilings.
    pub fn new(cfg: &Config) -> Self {
        Self {
            max_user_job_memory: cfg.user_job_memory(),
            cluster_job_memory_limit: cfg.cluster_job_memory(),
        }
    }

    /// Computes the priority score and memory hint for one submission.
    ///
    /// ### Parameters
    /// - `complexity`: the persisted complexity estimate
    /// - `cluster_memory_total`: total cluster memory from the latest
    ///   [`ClusterState`](crate::cluster::ClusterState) snapshot
    /// - `waited`: how long the submission has been queued. At submit time
    ///   this is effectively zero; the aging bonus only takes effect when the
    ///   caller recomputes the estimate for a submission that has sat in the
    ///   queue.
    ///
    /// ### Errors
    /// [`ScheduleError::JobMemoryLimitExceeded`] when the derived
    /// `min_job_memory` exceeds the per-user ceiling or is unattainable given
    /// the cluster-wide job memory limit. Fatal for the submission; reported
    /// to the caller, never retried.
    pub fn compute(
        &self,
        complexity: &Complexity,
        cluster_memory_total: u64,
        waited: Duration,
    ) -> Result<PriorityEstimate, ScheduleError> {
        let min_job_memory = complexity.peak_job_memory();

        if let Some(limit) = self.max_user_job_memory {
            if min_job_memory > limit {
                return Err(ScheduleError::JobMemoryLimitExceeded {
                    requested: min_job_memory,
                    limit,
                });
            }
        }
        if let Some(limit) = self.cluster_job_memory_limit {
            if min_job_memory > limit {
                return Err(ScheduleError::JobMemoryLimitExceeded {
                    requested: min_job_memory,
                    limit,
                });
            }
        }

        let ratio = if cluster_memory_total == 0 {
            // No cluster information: treat every workflow as weightless
            // rather than penalizing all of them equally.
            0.0
        } else {
            (min_job_memory as f64 / cluster_memory_total as f64).clamp(0.0, 1.0)
        };
        let memory_score = ((1.0 - ratio) * MEMORY_SCORE_SCALE).round() as i32;
        let wait_bonus = ((waited.as_secs() / 60).min(MAX_WAIT_BONUS as u64)) as i32;

        Ok(PriorityEstimate {
            priority: memory_score + wait_bonus,
            min_job_memory,
        })
    }
}
