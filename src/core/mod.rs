//! Core orchestration: the admission scheduler and the restart path.
//!
//! ## Contents
//! - [`AdmissionScheduler`] — validates, estimates, queues and admits
//!   workflow submissions against live cluster capacity
//! - restart support ([`AdmissionScheduler::restart`]) — atomic clone of a
//!   finished workflow with fresh retention rules

mod restart;
mod scheduler;
#[cfg(test)]
pub(crate) mod testkit;

pub use scheduler::AdmissionScheduler;
