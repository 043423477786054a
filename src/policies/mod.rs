//! Admission policies.
//!
//! This module groups the knobs that control **whether** a submission is
//! admitted immediately or weighted against cluster load, **which** cluster
//! checks gate admission, and **how** a balanced submission's priority and
//! memory hint are computed.
//!
//! ## Contents
//! - [`SchedulingPolicy`] — fifo vs. balanced admission
//! - [`CheckLevel`] — which readiness checks apply (`0|1|2|9`)
//! - [`PriorityCalculator`], [`PriorityEstimate`] — priority score and
//!   minimum per-job memory hint for balanced submissions
//!
//! ## Quick wiring
//! ```text
//! Config { scheduling_policy, readiness_check_level, memory ceilings }
//!      └─► core::scheduler::AdmissionScheduler uses:
//!           - SchedulingPolicy::select() at construction (fatal on error)
//!           - PriorityCalculator::compute() for balanced submissions only
//!           - CheckLevel to evaluate ClusterState snapshots per attempt
//! ```

mod priority;
mod readiness;
mod scheduling;

pub use priority::{PriorityCalculator, PriorityEstimate};
pub use readiness::CheckLevel;
pub use scheduling::SchedulingPolicy;
