//! Per-tenant resource quotas.
//!
//! ## Contents
//! - [`ResourceKind`], [`QuotaRecord`] — the per-(tenant, resource) counter
//! - [`QuotaStore`] — persistence seam for quota counters
//! - [`QuotaGuard`], [`QuotaPermit`] — the gate-then-commit check
//! - [`human_bytes`], [`human_amount`] — human-readable rendering for
//!   user-visible messages

mod guard;
mod record;

pub use guard::{QuotaGuard, QuotaPermit, QuotaStore};
pub use record::{human_amount, human_bytes, QuotaRecord, ResourceKind};
