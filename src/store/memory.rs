//! In-memory submission store.
//!
//! A single mutex over the full state makes every trait method a
//! transaction for free. Suitable for tests and single-process
//! embedders; a database-backed store would implement the same trait.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::cluster::Complexity;
use crate::error::ScheduleError;
use crate::retention::{RetentionRule, RuleStatus};
use crate::store::SubmissionStore;
use crate::submission::{WorkflowSpec, WorkflowStatus, WorkflowSubmission};

#[derive(Default)]
struct Inner {
    submissions: HashMap<Uuid, WorkflowSubmission>,
    rules: HashMap<Uuid, Vec<RetentionRule>>,
    failure_reasons: HashMap<Uuid, String>,
}

impl Inner {
    fn get_mut(&mut self, id: Uuid) -> Result<&mut WorkflowSubmission, ScheduleError> {
        self.submissions
            .get_mut(&id)
            .ok_or_else(|| ScheduleError::Storage {
                reason: format!("submission {id} not found"),
            })
    }
}

/// In-process [`SubmissionStore`] backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Failure reason recorded by [`SubmissionStore::mark_failed`], if any.
    pub async fn failure_reason(&self, id: Uuid) -> Option<String> {
        self.inner.lock().await.failure_reasons.get(&id).cloned()
    }

    /// Forces a status, modeling an out-of-band transition (stop, delete).
    pub async fn set_status(&self, id: Uuid, status: WorkflowStatus) -> Result<(), ScheduleError> {
        let mut inner = self.inner.lock().await;
        inner.get_mut(id)?.status = status;
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn insert(&self, submission: WorkflowSubmission) -> Result<(), ScheduleError> {
        let mut inner = self.inner.lock().await;
        if inner.submissions.contains_key(&submission.id) {
            return Err(ScheduleError::Storage {
                reason: format!("submission {} already exists", submission.id),
            });
        }
        inner.submissions.insert(submission.id, submission);
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<WorkflowSubmission, ScheduleError> {
        let inner = self.inner.lock().await;
        inner
            .submissions
            .get(&id)
            .cloned()
            .ok_or_else(|| ScheduleError::Storage {
                reason: format!("submission {id} not found"),
            })
    }

    async fn status(&self, id: Uuid) -> Result<WorkflowStatus, ScheduleError> {
        let inner = self.inner.lock().await;
        inner
            .submissions
            .get(&id)
            .map(|s| s.status)
            .ok_or_else(|| ScheduleError::Storage {
                reason: format!("submission {id} not found"),
            })
    }

    async fn list_queued(&self) -> Result<Vec<WorkflowSubmission>, ScheduleError> {
        let inner = self.inner.lock().await;
        let mut queued: Vec<WorkflowSubmission> = inner
            .submissions
            .values()
            .filter(|s| s.status == WorkflowStatus::Queued)
            .cloned()
            .collect();
        queued.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(queued)
    }

    async fn mark_queued(&self, id: Uuid) -> Result<(), ScheduleError> {
        let mut inner = self.inner.lock().await;
        inner.get_mut(id)?.status = WorkflowStatus::Queued;
        Ok(())
    }

    async fn set_estimates(
        &self,
        id: Uuid,
        complexity: Complexity,
        priority: i32,
        min_job_memory: u64,
    ) -> Result<(), ScheduleError> {
        let mut inner = self.inner.lock().await;
        let sub = inner.get_mut(id)?;
        sub.complexity = Some(complexity);
        sub.priority = priority;
        sub.min_job_memory = min_job_memory;
        Ok(())
    }

    async fn mark_admitted(&self, id: Uuid) -> Result<(), ScheduleError> {
        let mut inner = self.inner.lock().await;
        inner.get_mut(id)?.status = WorkflowStatus::Running;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<(), ScheduleError> {
        let mut inner = self.inner.lock().await;
        inner.get_mut(id)?.status = WorkflowStatus::Failed;
        inner.failure_reasons.insert(id, reason.to_string());
        Ok(())
    }

    async fn set_retention_rules(
        &self,
        id: Uuid,
        rules: Vec<RetentionRule>,
    ) -> Result<(), ScheduleError> {
        let mut inner = self.inner.lock().await;
        inner.get_mut(id)?;
        inner.rules.insert(id, rules);
        Ok(())
    }

    async fn retention_rules(&self, id: Uuid) -> Result<Vec<RetentionRule>, ScheduleError> {
        let inner = self.inner.lock().await;
        Ok(inner.rules.get(&id).cloned().unwrap_or_default())
    }

    async fn clone_for_restart(
        &self,
        original_id: Uuid,
        spec: WorkflowSpec,
        parameters: serde_json::Value,
        rules: Vec<RetentionRule>,
    ) -> Result<WorkflowSubmission, ScheduleError> {
        let mut inner = self.inner.lock().await;
        let original = inner
            .submissions
            .get(&original_id)
            .ok_or_else(|| ScheduleError::Storage {
                reason: format!("submission {original_id} not found"),
            })?
            .clone();

        let mut clone =
            WorkflowSubmission::new(original.owner_id, original.kind.clone(), spec)
                .with_parameters(parameters);
        clone.workspace_path = original.workspace_path.clone();
        clone.run_number = original.run_number;
        clone.restart = true;

        // Everything below is infallible, so this block stays atomic.
        if let Some(old_rules) = inner.rules.get_mut(&original_id) {
            for rule in old_rules.iter_mut() {
                if rule.status == RuleStatus::Active {
                    rule.status = RuleStatus::Inactive;
                }
            }
        }
        inner.rules.insert(clone.id, rules);
        inner.submissions.insert(clone.id, clone.clone());
        Ok(clone)
    }
}
