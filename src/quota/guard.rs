//! # Quota guard: gate-then-commit checks over persisted counters.
//!
//! [`QuotaGuard`] checks a tenant's cumulative usage against its hard limit
//! before any resource-consuming action is allowed. The guard only gates: it
//! never mutates the counter during the check. The caller commits usage via
//! the returned [`QuotaPermit`] after the guarded action actually consumed
//! the resource, or drops the permit to abandon it.
//!
//! ## Invariants
//! - `limit == 0` means unlimited; the check passes unconditionally.
//! - Checks for the same (tenant, kind) pair are serialized by a per-key
//!   async lock held for the lifetime of the permit, so two concurrent
//!   submissions from one tenant can never both pass the gate and jointly
//!   overshoot the limit.
//! - A rejected check commits nothing; there is nothing to roll back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::quota::{QuotaRecord, ResourceKind};

/// Persistence seam for quota counters.
#[async_trait]
pub trait QuotaStore: Send + Sync + 'static {
    /// Loads the record for one (tenant, kind) pair.
    ///
    /// Tenants with no explicit record are unlimited (`QuotaRecord::default`).
    async fn record(&self, owner: Uuid, kind: ResourceKind) -> Result<QuotaRecord, ScheduleError>;

    /// Adds committed usage to the persisted counter.
    async fn add_usage(
        &self,
        owner: Uuid,
        kind: ResourceKind,
        bytes: u64,
    ) -> Result<(), ScheduleError>;
}

/// Gates resource-consuming actions against per-tenant quota limits.
pub struct QuotaGuard {
    store: Arc<dyn QuotaStore>,
    // One lock per (tenant, kind); created lazily, never removed. The map
    // stays small: tenants × two resource kinds.
    locks: Mutex<HashMap<(Uuid, ResourceKind), Arc<Mutex<()>>>>,
}

impl QuotaGuard {
    /// Creates a guard over the given counter store.
    pub fn new(store: Arc<dyn QuotaStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn key_lock(&self, owner: Uuid, kind: ResourceKind) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry((owner, kind))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Checks whether `bytes_to_add` fits within the tenant's quota.
    ///
    /// On success returns a [`QuotaPermit`] holding the per-key lock; call
    /// [`QuotaPermit::commit`] once the guarded action has actually consumed
    /// the resource, or drop the permit to walk away without committing.
    ///
    /// ### Errors
    /// [`ScheduleError::QuotaExceeded`] when `used + bytes_to_add > limit`
    /// and the limit is set. The message carries `action`, the
    /// human-readable limit and a documentation pointer; it is shown to
    /// users.
    pub async fn check(
        &self,
        owner: Uuid,
        kind: ResourceKind,
        bytes_to_add: u64,
        action: &str,
    ) -> Result<QuotaPermit, ScheduleError> {
        let lock = self.key_lock(owner, kind).await;
        let held = lock.lock_owned().await;

        let record = self.store.record(owner, kind).await?;
        if record.would_exceed(bytes_to_add) {
            tracing::info!(
                owner = %owner,
                resource = kind.as_label(),
                limit = record.limit,
                used = record.used,
                requested = bytes_to_add,
                "quota check rejected"
            );
            return Err(ScheduleError::QuotaExceeded {
                resource: kind.as_label(),
                limit: record.limit,
                used: record.used,
                action: action.to_string(),
            });
        }

        Ok(QuotaPermit {
            store: Arc::clone(&self.store),
            owner,
            kind,
            _held: held,
        })
    }

    /// Rejects tenants whose usage already reaches any resource limit.
    ///
    /// The admission gate: queuing a workflow consumes no quota by itself,
    /// so this checks exhaustion rather than claiming bytes.
    pub async fn ensure_not_exhausted(
        &self,
        owner: Uuid,
        action: &str,
    ) -> Result<(), ScheduleError> {
        for kind in [ResourceKind::Disk, ResourceKind::Cpu] {
            let record = self.store.record(owner, kind).await?;
            if record.is_exhausted() {
                tracing::info!(
                    owner = %owner,
                    resource = kind.as_label(),
                    limit = record.limit,
                    used = record.used,
                    "quota exhausted"
                );
                return Err(ScheduleError::QuotaExceeded {
                    resource: kind.as_label(),
                    limit: record.limit,
                    used: record.used,
                    action: action.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Builds an aggregate excess report across all resource kinds.
    ///
    /// Lists every resource whose usage reaches or exceeds its limit; used to
    /// give tenants one actionable message instead of piecemeal rejections.
    /// Returns `None` when nothing is exhausted.
    pub async fn excess_report(&self, owner: Uuid) -> Result<Option<String>, ScheduleError> {
        let mut lines = Vec::new();
        for kind in [ResourceKind::Disk, ResourceKind::Cpu] {
            let record = self.store.record(owner, kind).await?;
            if record.is_exhausted() {
                let used = crate::quota::human_amount(kind.as_label(), record.used);
                let limit = crate::quota::human_amount(kind.as_label(), record.limit);
                lines.push(format!("Resource: {kind}, usage: {used} of {limit}"));
            }
        }
        if lines.is_empty() {
            return Ok(None);
        }
        let mut message = String::from("User quota exceeded.\n");
        for line in &lines {
            message.push_str(line);
            message.push('\n');
        }
        message.push_str(&format!("Please see: {}", crate::error::QUOTA_DOCS_URL));
        Ok(Some(message))
    }
}

/// Proof that a quota check passed; holds the per-key lock until committed
/// or dropped.
pub struct QuotaPermit {
    store: Arc<dyn QuotaStore>,
    owner: Uuid,
    kind: ResourceKind,
    _held: OwnedMutexGuard<()>,
}

impl std::fmt::Debug for QuotaPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaPermit")
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl QuotaPermit {
    /// Commits actual usage after the guarded action consumed the resource.
    ///
    /// `bytes` may differ from the checked amount (e.g. the upload turned out
    /// smaller); committing more than was checked is the caller's bug.
    pub async fn commit(self, bytes: u64) -> Result<(), ScheduleError> {
        self.store.add_usage(self.owner, self.kind, bytes).await
    }
}
