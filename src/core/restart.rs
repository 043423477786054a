//! Workflow restart: atomic clone with fresh retention rules.
//!
//! ## Rules
//! - Rules for the clone are resolved from the *new* specification before
//!   any state changes; an invalid rule aborts the restart with the
//!   original untouched.
//! - Clone creation, predecessor rule inactivation and rule attachment are
//!   one store transaction (see
//!   [`SubmissionStore::clone_for_restart`](crate::store::SubmissionStore::clone_for_restart)).
//! - The clone shares the original's workspace and run number and starts in
//!   `Created`; the caller submits it like any fresh workflow.

use serde_json::Value;
use uuid::Uuid;

use crate::core::AdmissionScheduler;
use crate::error::ScheduleError;
use crate::events::{Event, EventKind};
use crate::retention::resolve_rules;
use crate::store::SubmissionStore;
use crate::submission::{WorkflowSpec, WorkflowSubmission};

impl AdmissionScheduler {
    /// Clones a workflow for restart, optionally under a changed
    /// specification.
    ///
    /// Without an override the clone inherits the original's specification.
    /// The returned clone is in `Created` state with the restart flag set;
    /// pass it to [`AdmissionScheduler::submit`] to queue it.
    ///
    /// ### Errors
    /// [`ScheduleError::InvalidRetentionRule`] when the resulting
    /// specification carries an invalid rule; storage errors when the
    /// original does not exist. In both cases no state changes.
    pub async fn restart(
        &self,
        original_id: Uuid,
        spec_override: Option<WorkflowSpec>,
        parameters: Value,
    ) -> Result<WorkflowSubmission, ScheduleError> {
        let spec = match spec_override {
            Some(spec) => spec,
            None => self.store.fetch(original_id).await?.spec,
        };
        let rules = resolve_rules(
            &spec.retention_days(),
            self.cfg.max_retention_days,
            &self.cfg.default_retention_pattern,
        )?;
        let clone = self
            .store
            .clone_for_restart(original_id, spec, parameters, rules)
            .await?;

        self.bus.publish(
            Event::now(EventKind::WorkflowRestarted)
                .with_workflow(clone.id.to_string())
                .with_reason(original_id.to_string()),
        );
        tracing::info!(
            workflow = %clone.id,
            predecessor = %original_id,
            run_number = clone.run_number,
            "workflow cloned for restart"
        );
        Ok(clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testkit::{harness, ready_cluster, ScriptedProbe};
    use crate::error::ScheduleError;
    use crate::events::EventKind;
    use crate::retention::RuleStatus;
    use crate::submission::{WorkflowStatus, WorkflowSubmission};

    fn spec_with_retention(pattern: &str, days: u32) -> WorkflowSpec {
        WorkflowSpec::new(serde_json::json!({
            "workspace": { "retention_days": { pattern: days } }
        }))
    }

    #[tokio::test]
    async fn restart_swaps_retention_rules_atomically() {
        let h = harness(Default::default(), ScriptedProbe::always(ready_cluster()));
        let mut rx = h.scheduler.bus().subscribe();

        let original = WorkflowSubmission::new(
            Uuid::new_v4(),
            "serial",
            spec_with_retention("data/*", 30),
        );
        let original_id = h.scheduler.submit(original).await.unwrap();

        let clone = h
            .scheduler
            .restart(
                original_id,
                Some(spec_with_retention("**/*.txt", 7)),
                Value::Null,
            )
            .await
            .unwrap();

        assert!(clone.restart);
        assert_eq!(clone.status, WorkflowStatus::Created);
        let attached = h.store.retention_rules(clone.id).await.unwrap();
        assert_eq!(attached.len(), 2);
        assert_eq!(attached[0].pattern, "**/*.txt");
        assert_eq!(attached[0].retention_days, 7);
        assert_eq!(attached[1].pattern, "**/*");

        let originals = h.store.retention_rules(original_id).await.unwrap();
        assert!(originals.iter().all(|r| r.status == RuleStatus::Inactive));

        // SubmissionQueued for the original, then the restart notification.
        let mut saw_restart = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::WorkflowRestarted {
                assert_eq!(ev.workflow.as_deref(), Some(clone.id.to_string().as_str()));
                assert_eq!(
                    ev.reason.as_deref(),
                    Some(original_id.to_string().as_str())
                );
                saw_restart = true;
            }
        }
        assert!(saw_restart);
    }

    #[tokio::test]
    async fn invalid_rules_abort_before_any_state_change() {
        let h = harness(Default::default(), ScriptedProbe::always(ready_cluster()));
        let original = WorkflowSubmission::new(
            Uuid::new_v4(),
            "serial",
            spec_with_retention("data/*", 30),
        );
        let original_id = h.scheduler.submit(original).await.unwrap();

        let err = h
            .scheduler
            .restart(
                original_id,
                Some(spec_with_retention("logs/*", 0)),
                Value::Null,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidRetentionRule { .. }));

        let originals = h.store.retention_rules(original_id).await.unwrap();
        assert!(originals.iter().any(|r| r.status == RuleStatus::Active));
    }

    #[tokio::test]
    async fn no_override_inherits_the_original_specification() {
        let h = harness(Default::default(), ScriptedProbe::always(ready_cluster()));
        let original = WorkflowSubmission::new(
            Uuid::new_v4(),
            "serial",
            spec_with_retention("data/*", 30),
        );
        let original_id = h.scheduler.submit(original).await.unwrap();

        let clone = h
            .scheduler
            .restart(original_id, None, Value::Null)
            .await
            .unwrap();

        let attached = h.store.retention_rules(clone.id).await.unwrap();
        assert_eq!(attached.len(), 2);
        assert_eq!(attached[0].pattern, "data/*");
        assert_eq!(attached[0].retention_days, 30);
    }
}
