//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use hcipower_common::{
    ClusterRef, Error, HostRef, PowerActionRequest, Result, TaskHandle, TaskStatus,
};
use hcipower_core::precheck::moref::ManagedObjectRef;
use hcipower_core::service::{
    HealthQuery, HostInventory, HostRuntimeStats, HostStatsMap, PowerActions, StatusQueryError,
    TaskStatusQuery,
};
use hcipower_core::{Orchestrator, OrchestratorSettings};
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HOST_TOKEN: &str = "mor:ManagedObjectReference:HostSystem:host-21";
pub const SIGNATURE: &str = "com.vmware.vsan.health.test.vconvsan";

/// Every call the orchestrator made against the fake
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    HealthSummary { category: String },
    HostStats,
    ResolveHost(ManagedObjectRef),
    Submit(PowerActionRequest),
    TaskStatus(TaskHandle),
}

/// Scripted in-memory management plane
pub struct FakeManagementPlane {
    health: Value,
    stats: HostStatsMap,
    submit_error: Option<String>,
    statuses: Mutex<VecDeque<std::result::Result<TaskStatus, StatusQueryError>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeManagementPlane {
    pub fn new() -> Self {
        Self {
            health: json!({ "groups": [] }),
            stats: BTreeMap::new(),
            submit_error: None,
            statuses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
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
        self.with_host(id, Some(connected_stats()))
    }

    pub fn with_submit_error(mut self, message: &str) -> Self {
        self.submit_error = Some(message.to_string());
        self
    }

    pub fn with_statuses(
        self,
        statuses: Vec<std::result::Result<TaskStatus, StatusQueryError>>,
    ) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<PowerActionRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Submit(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn status_queries(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::TaskStatus(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl HealthQuery for FakeManagementPlane {
    async fn query_health_summary(&self, _cluster: &ClusterRef, category: &str) -> Result<Value> {
        self.record(Call::HealthSummary {
            category: category.to_string(),
        });
        Ok(self.health.clone())
    }
}

#[async_trait]
impl HostInventory for FakeManagementPlane {
    async fn query_host_runtime_stats(&self, _cluster: &ClusterRef) -> Result<HostStatsMap> {
        self.record(Call::HostStats);
        Ok(self.stats.clone())
    }

    async fn resolve_host(&self, reference: &ManagedObjectRef) -> Result<HostRef> {
        self.record(Call::ResolveHost(reference.clone()));
        Ok(HostRef::new(reference.object_type.clone(), reference.object_id.clone())
            .with_name(format!("esx-{}", reference.object_id)))
    }
}

#[async_trait]
impl PowerActions for FakeManagementPlane {
    async fn submit_power_action(
        &self,
        _cluster: &ClusterRef,
        request: &PowerActionRequest,
    ) -> Result<TaskHandle> {
        self.record(Call::Submit(request.clone()));
        match self.submit_error {
            Some(ref message) => Err(Error::Invocation(message.clone())),
            None => Ok(TaskHandle::new("task-42")),
        }
    }
}

#[async_trait]
impl TaskStatusQuery for FakeManagementPlane {
    async fn query_task_status(
        &self,
        task: &TaskHandle,
    ) -> std::result::Result<TaskStatus, StatusQueryError> {
        self.record(Call::TaskStatus(task.clone()));
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StatusQueryError::Other("no scripted status left".to_string())))
    }
}

pub fn connected_stats() -> HostRuntimeStats {
    let mut stats = BTreeMap::new();
    stats.insert("uptime".to_string(), json!(86400));
    HostRuntimeStats(stats)
}

pub fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        poll_interval: Duration::from_millis(1),
        ..Default::default()
    }
}

pub fn orchestrator(fake: &Arc<FakeManagementPlane>) -> Orchestrator<FakeManagementPlane> {
    Orchestrator::new(fake.clone(), settings())
}

pub fn cluster() -> ClusterRef {
    ClusterRef::new("cluster-a")
}

/// A single test entry in health payload shape
pub fn health_test(id: &str, health: &str, token: Option<&str>) -> Value {
    let details = match token {
        Some(t) => json!([{ "label": "Hosts", "rows": [{ "values": [t] }] }]),
        None => Value::Null,
    };
    json!({
        "testId": id,
        "testName": id,
        "testHealth": health,
        "testDetails": details,
    })
}

/// A health group in payload shape
pub fn health_group(id: &str, health: &str, tests: Vec<Value>) -> Value {
    json!({
        "groupId": id,
        "groupName": id,
        "groupHealth": health,
        "groupTests": tests,
    })
}

pub fn health_payload(groups: Vec<Value>) -> Value {
    json!({ "groups": groups })
}

/// Payload of a cluster whose management plane runs on host-21
pub fn self_hosted_payload() -> Value {
    health_payload(vec![health_group(
        "cluster",
        "yellow",
        vec![health_test(SIGNATURE, "yellow", Some(HOST_TOKEN))],
    )])
}
