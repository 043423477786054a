//! Workflow submissions: lifecycle status, the submission record and the
//! opaque specification document.
//!
//! ## Contents
//! - [`WorkflowStatus`] — persisted lifecycle states
//! - [`AdmissionOutcome`] — terminal result of one pass through the
//!   admission loop
//! - [`WorkflowSubmission`] — one admission attempt's record
//! - [`WorkflowSpec`] — opaque structured document with typed accessors

mod record;
mod spec;

pub use record::{AdmissionOutcome, WorkflowStatus, WorkflowSubmission};
pub use spec::WorkflowSpec;
