//! Power transition prechecks
//!
//! Two independent gates: the health gate guards power-off, the connectivity
//! gate guards power-on. Neither mutates anything.

pub mod detector;
pub mod moref;
pub mod parser;

use hcipower_common::{
    ClusterRef, Error, HealthGateFailure, HostRef, ManagementLocation, PreconditionFailure, Result,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::service::{HealthQuery, HostInventory};
use detector::{Detection, SelfHostedDetector};

/// Health check category evaluated before a cluster power-off
pub const POWER_OFF_PRECHECK_CATEGORY: &str = "clusterPowerOffPrecheck";

/// Result of the power-off health gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthGate {
    Pass(ManagementLocation),
    Fail(HealthGateFailure),
}

impl HealthGate {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass(_))
    }

    pub fn into_result(self) -> Result<ManagementLocation> {
        match self {
            Self::Pass(location) => Ok(location),
            Self::Fail(failure) => Err(Error::Precondition(PreconditionFailure::Health(failure))),
        }
    }
}

/// Result of the power-on connectivity gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityGate {
    Pass,
    Fail { disconnected: Vec<HostRef> },
}

impl ConnectivityGate {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Pass)
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Pass => Ok(()),
            Self::Fail { disconnected } => Err(Error::Precondition(
                PreconditionFailure::Connectivity { disconnected },
            )),
        }
    }
}

/// Evaluates the gates against the management plane
pub struct PreconditionEvaluator<'a, S: ?Sized> {
    service: &'a S,
    category: String,
    detector: SelfHostedDetector,
}

impl<'a, S> PreconditionEvaluator<'a, S>
where
    S: HealthQuery + HostInventory + ?Sized,
{
    pub fn new(service: &'a S) -> Self {
        Self {
            service,
            category: POWER_OFF_PRECHECK_CATEGORY.to_string(),
            detector: SelfHostedDetector::default(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_detector(mut self, detector: SelfHostedDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Gate for power-off. On pass, reports where the management plane runs.
    pub async fn evaluate_health_gate(&self, cluster: &ClusterRef) -> Result<HealthGate> {
        let raw = self
            .service
            .query_health_summary(cluster, &self.category)
            .await?;
        let summary = parser::parse_health_summary(&raw)?;

        if summary.is_empty() {
            info!(cluster = %cluster, category = %self.category, "No health groups to check");
            return Ok(HealthGate::Pass(ManagementLocation::NotSelfHosted));
        }

        match self.detector.scan(&summary) {
            Detection::Disqualified(failure) => {
                warn!(cluster = %cluster, reason = %failure, "Health gate failed");
                Ok(HealthGate::Fail(failure))
            }
            Detection::Clear { orchestration_host: None } => {
                info!(cluster = %cluster, groups = summary.groups.len(), "Health gate passed");
                Ok(HealthGate::Pass(ManagementLocation::NotSelfHosted))
            }
            Detection::Clear { orchestration_host: Some(reference) } => {
                let host = self.service.resolve_host(&reference).await?;
                info!(
                    cluster = %cluster,
                    host = %host,
                    "Health gate passed; management plane runs inside the cluster"
                );
                Ok(HealthGate::Pass(ManagementLocation::SelfHostedOn(host)))
            }
        }
    }

    /// Gate for power-on. Fails with every host whose statistics are missing.
    pub async fn evaluate_connectivity_gate(
        &self,
        cluster: &ClusterRef,
    ) -> Result<ConnectivityGate> {
        let stats = self.service.query_host_runtime_stats(cluster).await?;

        if stats.is_empty() {
            warn!(cluster = %cluster, "Cluster reported no hosts");
        }

        let total = stats.len();
        let mut disconnected: Vec<HostRef> = stats
            .into_iter()
            .filter(|(_, s)| s.as_ref().map_or(true, |s| s.is_empty()))
            .map(|(host, _)| host)
            .collect();
        disconnected.sort_by(|a, b| a.id.cmp(&b.id));

        if disconnected.is_empty() {
            info!(cluster = %cluster, hosts = total, "Connectivity gate passed");
            Ok(ConnectivityGate::Pass)
        } else {
            for host in &disconnected {
                warn!(cluster = %cluster, host = %host, "Host is disconnected");
            }
            Ok(ConnectivityGate::Fail { disconnected })
        }
    }
}
