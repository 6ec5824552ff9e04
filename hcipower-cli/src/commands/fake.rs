//! In-memory management plane for command tests

use async_trait::async_trait;
use hcipower_common::{ClusterRef, HostRef, PowerActionRequest, Result, TaskHandle, TaskStatus};
use hcipower_core::precheck::moref::ManagedObjectRef;
use hcipower_core::service::{
    HealthQuery, HostInventory, HostRuntimeStats, HostStatsMap, PowerActions, StatusQueryError,
    TaskStatusQuery,
};
use hcipower_core::{Orchestrator, OrchestratorSettings};
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct FakePlane {
    health: Value,
    stats: HostStatsMap,
    statuses: Mutex<VecDeque<std::result::Result<TaskStatus, StatusQueryError>>>,
    calls: AtomicUsize,
    submissions: AtomicUsize,
}

impl FakePlane {
    pub fn new() -> Self {
        Self {
            health: json!({ "groups": [] }),
            stats: BTreeMap::new(),
            statuses: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
        }
    }

    pub fn with_health(mut self, health: Value) -> Self {
        self.health = health;
        self
    }

    pub fn with_host(mut self, id: &str, stats: Option<HostRuntimeStats>) -> Self {
        self.stats.insert(HostRef::new("HostSystem", id), stats);
        self
    }

    pub fn with_connected_host(self, id: &str) -> Self {
        let mut stats = BTreeMap::new();
        stats.insert("uptime".to_string(), json!(3600));
        self.with_host(id, Some(HostRuntimeStats(stats)))
    }

    pub fn with_statuses(
        self,
        statuses: Vec<std::result::Result<TaskStatus, StatusQueryError>>,
    ) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    /// Calls of any kind made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthQuery for FakePlane {
    async fn query_health_summary(&self, _cluster: &ClusterRef, _category: &str) -> Result<Value> {
        self.record();
        Ok(self.health.clone())
    }
}

#[async_trait]
impl HostInventory for FakePlane {
    async fn query_host_runtime_stats(&self, _cluster: &ClusterRef) -> Result<HostStatsMap> {
        self.record();
        Ok(self.stats.clone())
    }

    async fn resolve_host(&self, reference: &ManagedObjectRef) -> Result<HostRef> {
        self.record();
        Ok(HostRef::new(
            reference.object_type.clone(),
            reference.object_id.clone(),
        ))
    }
}

#[async_trait]
impl PowerActions for FakePlane {
    async fn submit_power_action(
        &self,
        _cluster: &ClusterRef,
        _request: &PowerActionRequest,
    ) -> Result<TaskHandle> {
        self.record();
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(TaskHandle::new("task-7"))
    }
}

#[async_trait]
impl TaskStatusQuery for FakePlane {
    async fn query_task_status(
        &self,
        _task: &TaskHandle,
    ) -> std::result::Result<TaskStatus, StatusQueryError> {
        self.record();
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StatusQueryError::Other("no scripted status left".to_string())))
    }
}

pub fn orchestrator(plane: &Arc<FakePlane>) -> Orchestrator<FakePlane> {
    Orchestrator::new(
        plane.clone(),
        OrchestratorSettings {
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        },
    )
}

pub fn cluster() -> ClusterRef {
    ClusterRef::new("cluster-a")
}

/// Health payload of a cluster whose management plane runs on host-21
pub fn self_hosted_health() -> Value {
    json!({
        "groups": [{
            "groupId": "cluster",
            "groupName": "Cluster",
            "groupHealth": "yellow",
            "groupTests": [{
                "testId": "com.vmware.vsan.health.test.vconvsan",
                "testName": "vCenter state is authoritative",
                "testHealth": "yellow",
                "testDetails": [{
                    "label": "Hosts",
                    "rows": [{ "values": ["mor:ManagedObjectReference:HostSystem:host-21"] }],
                }],
            }],
        }],
    })
}
