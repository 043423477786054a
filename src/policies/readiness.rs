//! # Readiness check levels.
//!
//! [`CheckLevel`] selects which cluster-capacity checks gate admission.
//! Levels follow the operator-facing numeric scheme:
//!
//! | Level | Name          | Meaning                                              |
//! |-------|---------------|------------------------------------------------------|
//! | `0`   | `no_checks`   | schedule new workflows as soon as they arrive        |
//! | `1`   | `concurrent`  | admit only below the running-workflow ceiling        |
//! | `2`   | `memory`      | admit only if the workflow fits in available memory  |
//! | `9`   | `all_checks`  | satisfy all previous criteria                        |
//!
//! Unknown levels are a configuration error; the typed API is strict even
//! though environment-driven deployments commonly default to `all_checks`.

use std::fmt;

use crate::error::ScheduleError;

/// Which cluster-capacity checks apply before admitting a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CheckLevel {
    /// No readiness check; always ready.
    NoChecks,
    /// Check the number of concurrently running submissions only.
    Concurrent,
    /// Check available cluster memory only.
    Memory,
    /// Perform all checks (default).
    #[default]
    AllChecks,
}

impl CheckLevel {
    /// Maps the operator-facing numeric level (`0|1|2|9`) to a check level.
    pub fn from_level(level: u8) -> Result<Self, ScheduleError> {
        match level {
            0 => Ok(CheckLevel::NoChecks),
            1 => Ok(CheckLevel::Concurrent),
            2 => Ok(CheckLevel::Memory),
            9 => Ok(CheckLevel::AllChecks),
            other => Err(ScheduleError::InvalidCheckLevel { level: other }),
        }
    }

    /// Whether this level includes the running-count check.
    #[inline]
    pub fn checks_concurrency(&self) -> bool {
        matches!(self, CheckLevel::Concurrent | CheckLevel::AllChecks)
    }

    /// Whether this level includes the free-memory check.
    #[inline]
    pub fn checks_memory(&self) -> bool {
        matches!(self, CheckLevel::Memory | CheckLevel::AllChecks)
    }
}

impl fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckLevel::NoChecks => "no_checks",
            CheckLevel::Concurrent => "concurrent",
            CheckLevel::Memory => "memory",
            CheckLevel::AllChecks => "all_checks",
        };
        f.write_str(name)
    }
}
