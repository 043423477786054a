//! # Admission scheduler.
//!
//! [`AdmissionScheduler`] is the write path of the crate: it takes a
//! [`WorkflowSubmission`], runs policy-dependent estimation and validation,
//! queues it, and evaluates cluster readiness until the submission is either
//! published to the execution queue or failed.
//!
//! ## Rules
//! - **Estimate once**: under the `balanced` policy, complexity and priority
//!   are computed at submit time and persisted; admission retries never call
//!   the estimator again. Under `fifo` the estimator is never called.
//! - **Fail-closed readiness**: a probe error is "not ready", never a
//!   submission failure.
//! - **Bounded retries**: a submission is evaluated at most
//!   [`Config::attempt_ceiling`] times; exhaustion fails it with the last
//!   deferral reason so operators can tell "cluster busy" from
//!   "insufficient memory".
//! - **External stop wins**: a submission whose status left `Queued` between
//!   attempts is reported [`AdmissionOutcome::Cancelled`] and never
//!   re-evaluated.
//! - **Publish then mark**: the store transition to `Running` happens only
//!   after the publish sink accepted the submission; a sink failure requeues
//!   exactly like a not-ready cluster.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::cluster::{
    AdmittedSubmission, ComplexityEstimator, ReadinessProbe, SubmissionPublisher,
};
use crate::config::Config;
use crate::error::ScheduleError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::{CheckLevel, PriorityCalculator, SchedulingPolicy};
use crate::quota::{QuotaGuard, QuotaStore};
use crate::retention::resolve_rules;
use crate::store::SubmissionStore;
use crate::submission::{AdmissionOutcome, WorkflowStatus, WorkflowSubmission};

/// Per-submission retry bookkeeping for the polling drain loop.
struct PendingAttempts {
    attempts: u32,
    not_before: Instant,
}

/// Validates, queues and admits workflow submissions.
///
/// Construction validates the configured policy and check level; a bad
/// configuration is rejected before any submission is accepted.
pub struct AdmissionScheduler {
    pub(super) cfg: Config,
    pub(super) store: Arc<dyn SubmissionStore>,
    pub(super) bus: Bus,
    probe: Arc<dyn ReadinessProbe>,
    estimator: Arc<dyn ComplexityEstimator>,
    publisher: Arc<dyn SubmissionPublisher>,
    quota: QuotaGuard,
    calculator: PriorityCalculator,
    policy: SchedulingPolicy,
    check_level: CheckLevel,
}

impl AdmissionScheduler {
    /// Creates a scheduler from configuration and its external contracts.
    ///
    /// ### Errors
    /// [`ScheduleError::InvalidPolicy`] / [`ScheduleError::InvalidCheckLevel`]
    /// when the configured policy name or readiness level is unknown.
    pub fn new(
        cfg: Config,
        store: Arc<dyn SubmissionStore>,
        probe: Arc<dyn ReadinessProbe>,
        estimator: Arc<dyn ComplexityEstimator>,
        publisher: Arc<dyn SubmissionPublisher>,
        quota_store: Arc<dyn QuotaStore>,
    ) -> Result<Self, ScheduleError> {
        let policy = SchedulingPolicy::select(&cfg.scheduling_policy)?;
        let check_level = CheckLevel::from_level(cfg.readiness_check_level)?;
        let calculator = PriorityCalculator::new(&cfg);
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Ok(Self {
            cfg,
            store,
            bus,
            probe,
            estimator,
            publisher,
            quota: QuotaGuard::new(quota_store),
            calculator,
            policy,
            check_level,
        })
    }

    /// The event bus; subscribe to observe the admission lifecycle.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Validates and queues a submission.
    ///
    /// Under the `balanced` policy this estimates complexity, computes the
    /// scheduling priority and persists both. All policies then pass the
    /// owner through the quota gate, resolve retention rules from the
    /// specification, and transition the submission to `Queued`.
    ///
    /// ### Errors
    /// Estimation, quota and retention failures mark the submission `Failed`
    /// in the store (with the reason) and are returned to the caller; only
    /// storage errors leave the record untouched.
    pub async fn submit(&self, submission: WorkflowSubmission) -> Result<Uuid, ScheduleError> {
        let id = submission.id;
        let wf = id.to_string();
        self.store.insert(submission.clone()).await?;

        if self.policy == SchedulingPolicy::Balanced {
            let complexity = match self.estimator.estimate(&submission.kind, &submission.spec).await
            {
                Ok(c) => c,
                Err(e) => return self.fail_submit(id, &wf, e).await,
            };
            // Estimation survives an unreachable probe: with no cluster
            // figure every workflow is weightless and ages normally.
            let total = match self.probe.snapshot().await {
                Ok(state) => state.total_memory,
                Err(e) => {
                    tracing::debug!(workflow = %wf, error = %e, "no cluster snapshot for estimation");
                    0
                }
            };
            let waited = submission.waited(Utc::now());
            let estimate = match self.calculator.compute(&complexity, total, waited) {
                Ok(est) => est,
                Err(e) => return self.fail_submit(id, &wf, e).await,
            };
            self.store
                .set_estimates(id, complexity, estimate.priority, estimate.min_job_memory)
                .await?;
            self.bus.publish(
                Event::now(EventKind::EstimateComputed)
                    .with_workflow(wf.clone())
                    .with_reason(format!(
                        "priority {}, min job memory {}",
                        estimate.priority,
                        crate::quota::human_bytes(estimate.min_job_memory)
                    )),
            );
        }

        // Queuing consumes no quota itself; the gate only turns away
        // tenants that are already at a limit.
        if let Err(err) = self
            .quota
            .ensure_not_exhausted(submission.owner_id, "Starting workflow")
            .await
        {
            let report = self
                .quota
                .excess_report(submission.owner_id)
                .await
                .ok()
                .flatten()
                .unwrap_or_else(|| err.to_string());
            self.bus.publish(
                Event::now(EventKind::QuotaRejected)
                    .with_workflow(wf.clone())
                    .with_reason(report),
            );
            return self.fail_submit(id, &wf, err).await;
        }

        let rules = match resolve_rules(
            &submission.spec.retention_days(),
            self.cfg.max_retention_days,
            &self.cfg.default_retention_pattern,
        ) {
            Ok(rules) => rules,
            Err(e) => return self.fail_submit(id, &wf, e).await,
        };
        self.store.set_retention_rules(id, rules).await?;

        self.store.mark_queued(id).await?;
        self.bus
            .publish(Event::now(EventKind::SubmissionQueued).with_workflow(wf.clone()));
        tracing::info!(workflow = %wf, policy = %self.policy, "submission queued");
        Ok(id)
    }

    /// Drives one submission through the admission loop to a terminal
    /// outcome.
    ///
    /// Evaluates readiness up to the attempt ceiling, sleeping
    /// [`Config::requeue_delay`] between attempts. The sleep is cancellable:
    /// `token` aborts the loop with [`AdmissionOutcome::Cancelled`].
    ///
    /// ### Errors
    /// Only storage errors; every admission-level result is an
    /// [`AdmissionOutcome`].
    pub async fn admit(
        &self,
        id: Uuid,
        token: &CancellationToken,
    ) -> Result<AdmissionOutcome, ScheduleError> {
        let wf = id.to_string();
        let ceiling = self.cfg.attempt_ceiling();
        let mut last_reason = String::new();

        for attempt in 1..=ceiling {
            if self.store.status(id).await? != WorkflowStatus::Queued {
                return Ok(self.cancelled(&wf, attempt));
            }
            self.bus.publish(
                Event::now(EventKind::AttemptStarted)
                    .with_workflow(wf.clone())
                    .with_attempt(attempt),
            );

            let sub = self.store.fetch(id).await?;
            match self.attempt_once(&sub).await {
                Ok(()) => {
                    self.bus.publish(
                        Event::now(EventKind::SubmissionAdmitted)
                            .with_workflow(wf.clone())
                            .with_attempt(attempt),
                    );
                    tracing::info!(workflow = %wf, attempt, "submission admitted");
                    return Ok(AdmissionOutcome::Admitted);
                }
                Err(err) if err.is_retryable() => {
                    last_reason = err.to_string();
                    self.bus.publish(
                        Event::now(EventKind::AttemptDeferred)
                            .with_workflow(wf.clone())
                            .with_attempt(attempt)
                            .with_delay(self.cfg.requeue_delay)
                            .with_reason(last_reason.clone()),
                    );
                    tracing::debug!(
                        workflow = %wf,
                        attempt,
                        reason = err.as_label(),
                        "admission deferred"
                    );
                    if attempt < ceiling {
                        tokio::select! {
                            _ = token.cancelled() => return Ok(self.cancelled(&wf, attempt)),
                            _ = tokio::time::sleep(self.cfg.requeue_delay) => {}
                        }
                    }
                }
                Err(err) => return self.failed(id, &wf, attempt, err.to_string()).await,
            }
        }

        self.failed(id, &wf, ceiling, last_reason).await
    }

    /// Long-running drain loop interleaving attempts across all queued
    /// submissions in priority order.
    ///
    /// Deferred submissions re-enter contention after the requeue delay
    /// rather than blocking the queue; newly queued higher-priority work
    /// overtakes them. Runs until `token` is cancelled.
    pub async fn run(&self, token: CancellationToken) {
        let ceiling = self.cfg.attempt_ceiling();
        let mut pending: HashMap<Uuid, PendingAttempts> = HashMap::new();
        tracing::info!(policy = %self.policy, checks = %self.check_level, "admission loop started");

        while !token.is_cancelled() {
            let queued = match self.store.list_queued().await {
                Ok(q) => q,
                Err(e) => {
                    tracing::warn!(error = %e, "listing queued submissions failed");
                    self.wait(&token, self.cfg.idle_poll).await;
                    continue;
                }
            };

            // A tracked submission no longer in the queue changed status
            // under us (stop, delete); report it cancelled and let go.
            let gone: Vec<Uuid> = pending
                .keys()
                .filter(|id| !queued.iter().any(|s| s.id == **id))
                .copied()
                .collect();
            for id in gone {
                pending.remove(&id);
                let _ = self.cancelled(&id.to_string(), 0);
            }
            for sub in &queued {
                pending.entry(sub.id).or_insert(PendingAttempts {
                    attempts: 0,
                    not_before: Instant::now(),
                });
            }

            let now = Instant::now();
            let next = queued
                .iter()
                .find(|s| pending.get(&s.id).map_or(false, |p| p.not_before <= now));
            let Some(sub) = next else {
                self.wait(&token, self.cfg.idle_poll).await;
                continue;
            };

            let wf = sub.id.to_string();
            let attempt = {
                let entry = pending.entry(sub.id).or_insert(PendingAttempts {
                    attempts: 0,
                    not_before: now,
                });
                entry.attempts += 1;
                entry.attempts
            };
            self.bus.publish(
                Event::now(EventKind::AttemptStarted)
                    .with_workflow(wf.clone())
                    .with_attempt(attempt),
            );

            match self.attempt_once(sub).await {
                Ok(()) => {
                    pending.remove(&sub.id);
                    self.bus.publish(
                        Event::now(EventKind::SubmissionAdmitted)
                            .with_workflow(wf.clone())
                            .with_attempt(attempt),
                    );
                    tracing::info!(workflow = %wf, attempt, "submission admitted");
                }
                Err(err) if err.is_retryable() && attempt < ceiling => {
                    if let Some(entry) = pending.get_mut(&sub.id) {
                        entry.not_before = now + self.cfg.requeue_delay;
                    }
                    self.bus.publish(
                        Event::now(EventKind::AttemptDeferred)
                            .with_workflow(wf.clone())
                            .with_attempt(attempt)
                            .with_delay(self.cfg.requeue_delay)
                            .with_reason(err.to_string()),
                    );
                    tracing::debug!(
                        workflow = %wf,
                        attempt,
                        reason = err.as_label(),
                        "admission deferred"
                    );
                }
                Err(err) => {
                    pending.remove(&sub.id);
                    if let Err(se) = self.failed(sub.id, &wf, attempt, err.to_string()).await {
                        tracing::warn!(workflow = %wf, error = %se, "failing submission failed");
                    }
                }
            }
        }

        self.bus.publish(Event::now(EventKind::ShutdownRequested));
        tracing::info!("admission loop shut down");
    }

    /// One readiness evaluation plus, when ready, the publish.
    ///
    /// Retryable errors mean "defer"; anything else is fatal for the
    /// submission.
    async fn attempt_once(&self, sub: &WorkflowSubmission) -> Result<(), ScheduleError> {
        let state =
            self.probe
                .snapshot()
                .await
                .map_err(|e| ScheduleError::ProbeUnavailable {
                    reason: e.to_string(),
                })?;

        if self.check_level.checks_concurrency() {
            if let Some(ceiling) = self.cfg.concurrency_ceiling() {
                if state.running >= ceiling {
                    return Err(ScheduleError::ClusterBusy {
                        running: state.running,
                        ceiling,
                    });
                }
            }
        }
        if self.check_level.checks_memory() {
            let needed = if sub.min_job_memory > 0 {
                sub.min_job_memory
            } else {
                self.cfg.default_job_memory
            };
            if state.available_memory < needed {
                return Err(ScheduleError::InsufficientMemory {
                    needed,
                    available: state.available_memory,
                });
            }
        }

        let admitted = AdmittedSubmission {
            owner_id: sub.owner_id,
            workflow_id: sub.id,
            parameters: sub.parameters.clone(),
            priority: sub.priority,
            min_job_memory: sub.min_job_memory,
        };
        if let Err(err) = self.publisher.publish(&admitted).await {
            return Err(match err {
                e @ ScheduleError::PublishFailed { .. } => e,
                other => ScheduleError::PublishFailed {
                    reason: other.to_string(),
                },
            });
        }
        self.store.mark_admitted(sub.id).await?;
        Ok(())
    }

    fn cancelled(&self, wf: &str, attempt: u32) -> AdmissionOutcome {
        let mut ev = Event::now(EventKind::SubmissionCancelled).with_workflow(wf.to_string());
        if attempt > 0 {
            ev = ev.with_attempt(attempt);
        }
        self.bus.publish(ev);
        tracing::info!(workflow = %wf, "submission cancelled before admission");
        AdmissionOutcome::Cancelled
    }

    async fn failed(
        &self,
        id: Uuid,
        wf: &str,
        attempt: u32,
        reason: String,
    ) -> Result<AdmissionOutcome, ScheduleError> {
        self.store.mark_failed(id, &reason).await?;
        self.bus.publish(
            Event::now(EventKind::SubmissionFailed)
                .with_workflow(wf.to_string())
                .with_attempt(attempt)
                .with_reason(reason.clone()),
        );
        tracing::warn!(workflow = %wf, attempt, %reason, "submission failed");
        Ok(AdmissionOutcome::Failed { reason })
    }

    async fn fail_submit(
        &self,
        id: Uuid,
        wf: &str,
        err: ScheduleError,
    ) -> Result<Uuid, ScheduleError> {
        self.store.mark_failed(id, &err.to_string()).await?;
        self.bus.publish(
            Event::now(EventKind::SubmissionFailed)
                .with_workflow(wf.to_string())
                .with_reason(err.to_string()),
        );
        tracing::warn!(workflow = %wf, error = %err, "submission rejected");
        Err(err)
    }

    async fn wait(&self, token: &CancellationToken, delay: std::time::Duration) {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cluster::ClusterState;
    use crate::core::testkit::{
        busy_cluster, harness, harness_full, harness_with, ready_cluster, FixedQuota,
        RecordingPublisher, ScriptedProbe, GIB,
    };
    use crate::quota::QuotaRecord;
    use crate::submission::WorkflowSpec;

    fn test_cfg() -> Config {
        Config {
            requeue_delay: Duration::ZERO,
            max_attempts: 3,
            ..Config::default()
        }
    }

    fn submission() -> WorkflowSubmission {
        WorkflowSubmission::new(Uuid::new_v4(), "serial", WorkflowSpec::empty())
    }

    #[tokio::test]
    async fn construction_rejects_unknown_policy() {
        let cfg = Config {
            scheduling_policy: "round-robin".to_string(),
            ..Config::default()
        };
        let err = AdmissionScheduler::new(
            cfg,
            crate::store::MemoryStore::new(),
            ScriptedProbe::always(ready_cluster()),
            crate::core::testkit::FixedEstimator::new(&[GIB]),
            RecordingPublisher::new(),
            FixedQuota::unlimited(),
        )
        .err()
        .expect("unknown policy must be rejected");
        assert!(matches!(err, ScheduleError::InvalidPolicy { .. }));
    }

    #[tokio::test]
    async fn construction_rejects_unknown_check_level() {
        let cfg = Config {
            readiness_check_level: 5,
            ..Config::default()
        };
        let err = AdmissionScheduler::new(
            cfg,
            crate::store::MemoryStore::new(),
            ScriptedProbe::always(ready_cluster()),
            crate::core::testkit::FixedEstimator::new(&[GIB]),
            RecordingPublisher::new(),
            FixedQuota::unlimited(),
        )
        .err()
        .expect("unknown check level must be rejected");
        assert!(matches!(err, ScheduleError::InvalidCheckLevel { level: 5 }));
    }

    #[tokio::test]
    async fn fifo_submit_never_estimates() {
        let h = harness(test_cfg(), ScriptedProbe::always(ready_cluster()));
        let id = h.scheduler.submit(submission()).await.unwrap();

        assert_eq!(h.estimator.call_count(), 0);
        let stored = h.store.fetch(id).await.unwrap();
        assert_eq!(stored.status, WorkflowStatus::Queued);
        assert_eq!(stored.priority, 0);
        assert_eq!(stored.min_job_memory, 0);
        assert!(stored.complexity.is_none());
    }

    #[tokio::test]
    async fn balanced_submit_estimates_once_and_persists() {
        let cfg = Config {
            scheduling_policy: "balanced".to_string(),
            ..test_cfg()
        };
        let h = harness(cfg, ScriptedProbe::always(ready_cluster()));
        let id = h.scheduler.submit(submission()).await.unwrap();

        assert_eq!(h.estimator.call_count(), 1);
        let stored = h.store.fetch(id).await.unwrap();
        // Peak job is 2 GiB of an 8 GiB cluster: score 75, no wait bonus yet.
        assert_eq!(stored.priority, 75);
        assert_eq!(stored.min_job_memory, 2 * GIB);
        assert!(stored.complexity.is_some());
    }

    #[tokio::test]
    async fn balanced_submit_fails_on_user_memory_ceiling() {
        let cfg = Config {
            scheduling_policy: "balanced".to_string(),
            max_user_job_memory: GIB,
            ..test_cfg()
        };
        let h = harness(cfg, ScriptedProbe::always(ready_cluster()));
        let err = h.scheduler.submit(submission()).await.unwrap_err();

        assert!(matches!(err, ScheduleError::JobMemoryLimitExceeded { .. }));
        let queued = h.store.list_queued().await.unwrap();
        assert!(queued.is_empty());
    }

    #[tokio::test]
    async fn exhausted_quota_rejects_at_submit() {
        let quota = FixedQuota::with(QuotaRecord {
            limit: 100,
            used: 100,
        });
        let h = harness_with(test_cfg(), ScriptedProbe::always(ready_cluster()), quota);
        let mut rx = h.scheduler.bus().subscribe();

        let sub = submission();
        let id = sub.id;
        let err = h.scheduler.submit(sub).await.unwrap_err();
        assert!(matches!(err, ScheduleError::QuotaExceeded { .. }));
        assert_eq!(h.store.status(id).await.unwrap(), WorkflowStatus::Failed);

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::QuotaRejected);
        assert!(ev.reason.as_deref().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn invalid_retention_days_fail_the_submission() {
        let h = harness(test_cfg(), ScriptedProbe::always(ready_cluster()));
        let spec = WorkflowSpec::new(serde_json::json!({
            "workspace": { "retention_days": { "data/*": 0 } }
        }));
        let sub = WorkflowSubmission::new(Uuid::new_v4(), "serial", spec);
        let id = sub.id;

        let err = h.scheduler.submit(sub).await.unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidRetentionRule { .. }));
        assert_eq!(h.store.status(id).await.unwrap(), WorkflowStatus::Failed);
        assert!(h.store.retention_rules(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_attaches_universal_retention_rule() {
        let h = harness(test_cfg(), ScriptedProbe::always(ready_cluster()));
        let id = h.scheduler.submit(submission()).await.unwrap();

        let rules = h.store.retention_rules(id).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].pattern, "**/*");
        assert_eq!(rules[0].retention_days, 365);
    }

    #[tokio::test]
    async fn admit_succeeds_once_the_cluster_frees_up() {
        let probe = ScriptedProbe::with_script(
            vec![Ok(busy_cluster(30)), Ok(busy_cluster(30))],
            ready_cluster(),
        );
        let h = harness(test_cfg(), probe);
        let id = h.scheduler.submit(submission()).await.unwrap();

        let outcome = h
            .scheduler
            .admit(id, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, AdmissionOutcome::Admitted);
        assert_eq!(h.probe.call_count(), 3);
        assert_eq!(h.publisher.published_ids(), vec![id]);
        assert_eq!(h.store.status(id).await.unwrap(), WorkflowStatus::Running);
    }

    #[tokio::test]
    async fn exhaustion_reports_the_last_deferral_reason() {
        let h = harness(test_cfg(), ScriptedProbe::always(busy_cluster(30)));
        let id = h.scheduler.submit(submission()).await.unwrap();

        let outcome = h
            .scheduler
            .admit(id, &CancellationToken::new())
            .await
            .unwrap();
        match outcome {
            AdmissionOutcome::Failed { reason } => assert!(reason.contains("cluster busy")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(h.probe.call_count(), 3);
        assert!(h.publisher.published_ids().is_empty());
        assert_eq!(h.store.status(id).await.unwrap(), WorkflowStatus::Failed);
        assert!(h
            .store
            .failure_reason(id)
            .await
            .unwrap()
            .contains("cluster busy"));
    }

    #[tokio::test]
    async fn memory_shortfall_uses_the_default_job_hint() {
        let cfg = Config {
            max_attempts: 1,
            ..test_cfg()
        };
        let starved = ClusterState {
            total_memory: 8 * GIB,
            available_memory: GIB,
            running: 0,
        };
        let h = harness(cfg, ScriptedProbe::always(starved));
        let id = h.scheduler.submit(submission()).await.unwrap();

        let outcome = h
            .scheduler
            .admit(id, &CancellationToken::new())
            .await
            .unwrap();
        match outcome {
            AdmissionOutcome::Failed { reason } => {
                assert!(reason.contains("insufficient cluster memory"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn probe_error_defers_instead_of_failing() {
        let probe = ScriptedProbe::with_script(
            vec![Err(ScheduleError::Storage {
                reason: "api unreachable".to_string(),
            })],
            ready_cluster(),
        );
        let h = harness(test_cfg(), probe);
        let id = h.scheduler.submit(submission()).await.unwrap();

        let outcome = h
            .scheduler
            .admit(id, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, AdmissionOutcome::Admitted);
        assert_eq!(h.probe.call_count(), 2);
    }

    #[tokio::test]
    async fn publish_failure_requeues_like_not_ready() {
        let h = harness_full(
            test_cfg(),
            ScriptedProbe::always(ready_cluster()),
            FixedQuota::unlimited(),
            RecordingPublisher::failing_first(1),
        );
        let id = h.scheduler.submit(submission()).await.unwrap();

        let outcome = h
            .scheduler
            .admit(id, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, AdmissionOutcome::Admitted);
        assert_eq!(h.probe.call_count(), 2);
        assert_eq!(h.publisher.published_ids(), vec![id]);
    }

    #[tokio::test]
    async fn external_stop_cancels_the_loop() {
        let h = harness(test_cfg(), ScriptedProbe::always(busy_cluster(30)));
        let id = h.scheduler.submit(submission()).await.unwrap();
        h.store
            .set_status(id, WorkflowStatus::Stopped)
            .await
            .unwrap();

        let outcome = h
            .scheduler
            .admit(id, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, AdmissionOutcome::Cancelled);
        assert_eq!(h.probe.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_the_requeue_sleep() {
        let cfg = Config {
            requeue_delay: Duration::from_secs(60),
            max_attempts: 5,
            ..Config::default()
        };
        let h = harness(cfg, ScriptedProbe::always(busy_cluster(30)));
        let id = h.scheduler.submit(submission()).await.unwrap();

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let scheduler = Arc::clone(&h.scheduler);
        let handle = tokio::spawn(async move { scheduler.admit(id, &loop_token).await });

        tokio::time::sleep(Duration::from_millis(1)).await;
        token.cancel();
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome, AdmissionOutcome::Cancelled);
        assert_eq!(h.probe.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_drains_the_queue_in_priority_order() {
        let h = harness(test_cfg(), ScriptedProbe::always(ready_cluster()));

        let mut low = submission();
        low.priority = 10;
        low.created_at = chrono::Utc::now() - chrono::Duration::minutes(5);
        let mut high = submission();
        high.priority = 50;
        for sub in [&low, &high] {
            h.store.insert(sub.clone()).await.unwrap();
            h.store.mark_queued(sub.id).await.unwrap();
        }

        let mut rx = h.scheduler.bus().subscribe();
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let scheduler = Arc::clone(&h.scheduler);
        let runner = tokio::spawn(async move { scheduler.run(loop_token).await });

        let mut admitted = Vec::new();
        while admitted.len() < 2 {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::SubmissionAdmitted {
                admitted.push(ev.workflow.as_deref().unwrap().to_string());
            }
        }
        token.cancel();
        runner.await.unwrap();

        assert_eq!(admitted, vec![high.id.to_string(), low.id.to_string()]);
        assert_eq!(h.store.status(low.id).await.unwrap(), WorkflowStatus::Running);
        assert_eq!(
            h.store.status(high.id).await.unwrap(),
            WorkflowStatus::Running
        );
    }
}
