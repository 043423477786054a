//! Submission persistence.
//!
//! ## Contents
//! - [`SubmissionStore`] — the transactional persistence seam; every
//!   multi-field update is atomic with respect to concurrent readers
//! - [`MemoryStore`] — in-process implementation for tests and embedders

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::SubmissionStore;
