//! # Scheduling policy selection.
//!
//! [`SchedulingPolicy`] decides how submissions are weighted before entering
//! the admission loop:
//!
//! - [`SchedulingPolicy::Fifo`] — first-in first-out; submissions are
//!   admitted in arrival order with priority `0` and no memory hint. No
//!   estimation call is made, keeping the common case cheap.
//! - [`SchedulingPolicy::Balanced`] — a weighted strategy taking into account
//!   existing multi-user workloads and the complexity of incoming workflows.
//!
//! Selection validates the configured policy name; any value other than
//! `"fifo"` or `"balanced"` is an operator error, fatal and never retried.

use std::fmt;
use std::str::FromStr;

use crate::error::ScheduleError;

/// Policy controlling how submissions are weighted for admission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SchedulingPolicy {
    /// First-in first-out: admit workflows as they come (default).
    #[default]
    Fifo,
    /// Complexity-weighted admission balancing multi-tenant workloads.
    Balanced,
}

impl SchedulingPolicy {
    /// Validates a configured policy name.
    ///
    /// Accepts exactly `"fifo"` and `"balanced"`; anything else fails with
    /// [`ScheduleError::InvalidPolicy`], which aborts the submission's
    /// admission without retry.
    pub fn select(configured: &str) -> Result<Self, ScheduleError> {
        configured.parse()
    }
}

impl FromStr for SchedulingPolicy {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fifo" => Ok(SchedulingPolicy::Fifo),
            "balanced" => Ok(SchedulingPolicy::Balanced),
            other => Err(ScheduleError::InvalidPolicy {
                policy: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingPolicy::Fifo => f.write_str("fifo"),
            SchedulingPolicy::Balanced => f.write_str("balanced"),
        }
    }
}
