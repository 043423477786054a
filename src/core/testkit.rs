//! Scripted fakes for the external contracts, shared by the core tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::cluster::{
    AdmittedSubmission, ClusterState, Complexity, ComplexityEstimator, JobEstimate,
    ReadinessProbe, SubmissionPublisher,
};
use crate::config::Config;
use crate::core::AdmissionScheduler;
use crate::error::ScheduleError;
use crate::quota::{QuotaRecord, QuotaStore, ResourceKind};
use crate::store::MemoryStore;
use crate::submission::WorkflowSpec;

pub const GIB: u64 = 1024 * 1024 * 1024;

/// A probe that replays scripted snapshots, then repeats a fallback state.
pub struct ScriptedProbe {
    pub calls: AtomicUsize,
    script: Mutex<VecDeque<Result<ClusterState, ScheduleError>>>,
    fallback: ClusterState,
}

impl ScriptedProbe {
    pub fn always(state: ClusterState) -> Arc<Self> {
        Self::with_script(Vec::new(), state)
    }

    pub fn with_script(
        script: Vec<Result<ClusterState, ScheduleError>>,
        fallback: ClusterState,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(script.into()),
            fallback,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReadinessProbe for ScriptedProbe {
    async fn snapshot(&self) -> Result<ClusterState, ScheduleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(step) => step,
            None => Ok(self.fallback),
        }
    }
}

/// Returns a fixed complexity and counts how often it is asked.
pub struct FixedEstimator {
    pub calls: AtomicUsize,
    complexity: Complexity,
}

impl FixedEstimator {
    pub fn new(job_memories: &[u64]) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            complexity: Complexity::new(
                job_memories
                    .iter()
                    .map(|&memory| JobEstimate { memory })
                    .collect(),
            ),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ComplexityEstimator for FixedEstimator {
    async fn estimate(
        &self,
        _kind: &str,
        _spec: &WorkflowSpec,
    ) -> Result<Complexity, ScheduleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.complexity.clone())
    }
}

/// Records published submissions; can be told to fail its first N calls.
pub struct RecordingPublisher {
    pub published: Mutex<Vec<AdmittedSubmission>>,
    fail_first: AtomicUsize,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Self::failing_first(0)
    }

    pub fn failing_first(n: usize) -> Arc<Self> {
        Arc::new(Self {
            published: Mutex::new(Vec::new()),
            fail_first: AtomicUsize::new(n),
        })
    }

    pub fn published_ids(&self) -> Vec<Uuid> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.workflow_id)
            .collect()
    }
}

#[async_trait]
impl SubmissionPublisher for RecordingPublisher {
    async fn publish(&self, submission: &AdmittedSubmission) -> Result<(), ScheduleError> {
        if self
            .fail_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ScheduleError::PublishFailed {
                reason: "queue unavailable".to_string(),
            });
        }
        self.published.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

/// Quota store serving one fixed record for every tenant and kind.
pub struct FixedQuota {
    record: QuotaRecord,
}

impl FixedQuota {
    pub fn unlimited() -> Arc<Self> {
        Arc::new(Self {
            record: QuotaRecord::default(),
        })
    }

    pub fn with(record: QuotaRecord) -> Arc<Self> {
        Arc::new(Self { record })
    }
}

#[async_trait]
impl QuotaStore for FixedQuota {
    async fn record(&self, _owner: Uuid, _kind: ResourceKind) -> Result<QuotaRecord, ScheduleError> {
        Ok(self.record)
    }

    async fn add_usage(
        &self,
        _owner: Uuid,
        _kind: ResourceKind,
        _bytes: u64,
    ) -> Result<(), ScheduleError> {
        Ok(())
    }
}

/// Everything a core test needs, wired together.
pub struct Harness {
    pub scheduler: Arc<AdmissionScheduler>,
    pub store: Arc<MemoryStore>,
    pub probe: Arc<ScriptedProbe>,
    pub estimator: Arc<FixedEstimator>,
    pub publisher: Arc<RecordingPublisher>,
}

pub fn harness(cfg: Config, probe: Arc<ScriptedProbe>) -> Harness {
    harness_with(cfg, probe, FixedQuota::unlimited())
}

pub fn harness_with(cfg: Config, probe: Arc<ScriptedProbe>, quota: Arc<FixedQuota>) -> Harness {
    harness_full(cfg, probe, quota, RecordingPublisher::new())
}

pub fn harness_full(
    cfg: Config,
    probe: Arc<ScriptedProbe>,
    quota: Arc<FixedQuota>,
    publisher: Arc<RecordingPublisher>,
) -> Harness {
    let store = MemoryStore::new();
    let estimator = FixedEstimator::new(&[2 * GIB, GIB]);
    let scheduler = Arc::new(
        AdmissionScheduler::new(
            cfg,
            Arc::clone(&store) as Arc<dyn crate::store::SubmissionStore>,
            Arc::clone(&probe) as Arc<dyn ReadinessProbe>,
            Arc::clone(&estimator) as Arc<dyn ComplexityEstimator>,
            Arc::clone(&publisher) as Arc<dyn SubmissionPublisher>,
            quota,
        )
        .expect("valid test configuration"),
    );
    Harness {
        scheduler,
        store,
        probe,
        estimator,
        publisher,
    }
}

pub fn ready_cluster() -> ClusterState {
    ClusterState {
        total_memory: 8 * GIB,
        available_memory: 6 * GIB,
        running: 0,
    }
}

pub fn busy_cluster(running: u64) -> ClusterState {
    ClusterState {
        total_memory: 8 * GIB,
        available_memory: 6 * GIB,
        running,
    }
}
