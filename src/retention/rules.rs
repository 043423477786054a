//! # Retention rule model and resolver.
//!
//! A [`RetentionRule`] binds a glob pattern over workspace-relative paths to
//! a number of days its matches are kept. Rules are immutable once created;
//! restarting a workflow inactivates the predecessor's active rules and
//! creates a fresh set for the clone.
//!
//! ## Resolution
//! [`resolve_rules`] validates every explicit `(pattern, days)` entry and
//! appends a synthetic universal rule when the caller supplied none for the
//! universal pattern. Validation is all-or-nothing: one invalid entry aborts
//! the whole resolution and no partial rule set is ever persisted.
//!
//! ## Invariants
//! - Every resolved set contains exactly one effective rule for the
//!   universal pattern.
//! - Result ordering is insertion order with the synthetic default last;
//!   consumers must not assume the default is first.
//! - `1 ≤ days ≤ max_days` for every rule.

use chrono::{DateTime, Utc};
use globset::Glob;

use crate::error::ScheduleError;

/// Enforcement status of a retention rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleStatus {
    /// The rule will be enforced once `apply_at` passes.
    Active,
    /// Superseded (e.g. by a restart); no longer enforced.
    Inactive,
    /// The rule has been applied; matching files were cleaned up.
    Applied,
}

/// One workspace retention rule. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetentionRule {
    /// Glob over workspace-relative paths.
    pub pattern: String,
    /// Days matching files are kept.
    pub retention_days: u32,
    /// Enforcement status.
    pub status: RuleStatus,
    /// When enforcement begins; stamped when the workflow reaches a terminal
    /// state, which is outside this core.
    pub apply_at: Option<DateTime<Utc>>,
}

impl RetentionRule {
    fn active(pattern: impl Into<String>, retention_days: u32) -> Self {
        Self {
            pattern: pattern.into(),
            retention_days,
            status: RuleStatus::Active,
            apply_at: None,
        }
    }
}

/// Validates explicit retention settings and appends the synthetic default.
///
/// ### Parameters
/// - `explicit`: `(pattern, days)` pairs as declared in the workflow
///   specification, in declaration order
/// - `max_days`: administrator-configured maximum retention period; also the
///   synthetic default's day count
/// - `default_pattern`: the universal pattern (normally `**/*`)
///
/// ### Errors
/// [`ScheduleError::InvalidRetentionRule`] when a pattern is not a valid
/// glob or its day count is outside `1..=max_days`. The first invalid entry
/// aborts resolution entirely.
pub fn resolve_rules(
    explicit: &[(String, u32)],
    max_days: u32,
    default_pattern: &str,
) -> Result<Vec<RetentionRule>, ScheduleError> {
    let mut rules = Vec::with_capacity(explicit.len() + 1);

    for (pattern, days) in explicit {
        if *days == 0 || *days > max_days {
            return Err(ScheduleError::InvalidRetentionRule {
                pattern: pattern.clone(),
                reason: format!("retention_days must be between 1 and {max_days}, got {days}"),
            });
        }
        if let Err(e) = Glob::new(pattern) {
            return Err(ScheduleError::InvalidRetentionRule {
                pattern: pattern.clone(),
                reason: format!("not a valid glob: {e}"),
            });
        }
        rules.push(RetentionRule::active(pattern.clone(), *days));
    }

    if !rules.iter().any(|r| r.pattern == default_pattern) {
        rules.push(RetentionRule::active(default_pattern, max_days));
    }

    Ok(rules)
}
