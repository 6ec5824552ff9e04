//! Contracts of the external management-plane services
//!
//! The orchestrator never talks to a backend directly; it only sees these traits.
//! `client::ManagementClient` implements them over HTTP, tests use in-memory fakes.

use async_trait::async_trait;
use hcipower_common::{ClusterRef, HostRef, PowerActionRequest, Result, TaskHandle, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::precheck::moref::ManagedObjectRef;

/// Runtime statistics of one host, as an untyped key/value bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostRuntimeStats(pub BTreeMap<String, serde_json::Value>);

impl HostRuntimeStats {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-host statistics; `None` means the host returned nothing
pub type HostStatsMap = BTreeMap<HostRef, Option<HostRuntimeStats>>;

/// Failure of a task status query
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusQueryError {
    /// The status endpoint could not be reached at all
    #[error("status endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait HealthQuery: Send + Sync {
    /// Raw health summary payload for a check category
    async fn query_health_summary(
        &self,
        cluster: &ClusterRef,
        category: &str,
    ) -> Result<serde_json::Value>;
}

#[async_trait]
pub trait HostInventory: Send + Sync {
    async fn query_host_runtime_stats(&self, cluster: &ClusterRef) -> Result<HostStatsMap>;

    /// Turn a parsed object reference into a usable host reference
    async fn resolve_host(&self, reference: &ManagedObjectRef) -> Result<HostRef>;
}

#[async_trait]
pub trait PowerActions: Send + Sync {
    /// Returns once the action is accepted, long before it completes
    async fn submit_power_action(
        &self,
        cluster: &ClusterRef,
        request: &PowerActionRequest,
    ) -> Result<TaskHandle>;
}

#[async_trait]
pub trait TaskStatusQuery: Send + Sync {
    async fn query_task_status(
        &self,
        task: &TaskHandle,
    ) -> std::result::Result<TaskStatus, StatusQueryError>;
}

/// Everything the orchestrator needs from the management plane
pub trait ManagementPlane: HealthQuery + HostInventory + PowerActions + TaskStatusQuery {}

impl<T> ManagementPlane for T where
    T: HealthQuery + HostInventory + PowerActions + TaskStatusQuery
{
}
