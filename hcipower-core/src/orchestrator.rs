//! Cluster power orchestration
//!
//! Power-off: health gate, then submit, then poll.
//! Power-on: connectivity gate, then submit, then poll.
//! A failed gate aborts before anything is submitted.

use chrono::{DateTime, Utc};
use hcipower_common::{
    ClusterRef, Error, ManagementLocation, PowerAction, PreconditionFailure, Result, TaskHandle,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::PowerConfig;
use crate::power::{
    PollOutcome, PowerActionInvoker, ProgressObserver, TaskPoller, DEFAULT_POLL_INTERVAL,
};
use crate::precheck::detector::{SelfHostedDetector, VC_ON_VSAN_TEST_ID};
use crate::precheck::{
    ConnectivityGate, HealthGate, PreconditionEvaluator, POWER_OFF_PRECHECK_CATEGORY,
};
use crate::service::ManagementPlane;

/// Tunables of one orchestration run
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub poll_interval: Duration,
    pub health_category: String,
    pub self_hosted_test_id: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            health_category: POWER_OFF_PRECHECK_CATEGORY.to_string(),
            self_hosted_test_id: VC_ON_VSAN_TEST_ID.to_string(),
        }
    }
}

impl From<&PowerConfig> for OrchestratorSettings {
    fn from(config: &PowerConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.polling.interval_ms),
            health_category: config.management.health_category.clone(),
            self_hosted_test_id: config.management.self_hosted_test_id.clone(),
        }
    }
}

/// Result of a power transition that was submitted
#[derive(Debug, Clone, Serialize)]
pub struct PowerReport {
    pub cluster: ClusterRef,
    pub action: PowerAction,
    pub task: TaskHandle,
    pub management: ManagementLocation,
    pub outcome: PollOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PowerReport {
    /// True when the task was seen to complete
    pub fn completed(&self) -> bool {
        matches!(self.outcome, PollOutcome::Succeeded { .. })
    }
}

/// Result of a read-only precheck
#[derive(Debug, Clone, Serialize)]
pub struct PrecheckReport {
    pub cluster: ClusterRef,
    pub action: PowerAction,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management: Option<ManagementLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<PreconditionFailure>,
    pub checked_at: DateTime<Utc>,
}

pub struct Orchestrator<S: ?Sized> {
    service: Arc<S>,
    settings: OrchestratorSettings,
    observer: Option<ProgressObserver>,
}

impl<S> Orchestrator<S>
where
    S: ManagementPlane + ?Sized,
{
    pub fn new(service: Arc<S>, settings: OrchestratorSettings) -> Self {
        Self {
            service,
            settings,
            observer: None,
        }
    }

    /// Receive every polled task status, e.g. to drive a progress bar
    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Run the flow named by `action`; unknown actions touch nothing
    pub async fn run(&self, cluster: &ClusterRef, action: &str) -> Result<PowerReport> {
        let action: PowerAction = action.parse()?;
        self.execute(cluster, action).await
    }

    pub async fn power_off(&self, cluster: &ClusterRef) -> Result<PowerReport> {
        self.execute(cluster, PowerAction::PowerOff).await
    }

    pub async fn power_on(&self, cluster: &ClusterRef) -> Result<PowerReport> {
        self.execute(cluster, PowerAction::PowerOn).await
    }

    pub async fn execute(&self, cluster: &ClusterRef, action: PowerAction) -> Result<PowerReport> {
        crate::log_power_operation!(action, cluster);
        let started_at = Utc::now();

        let management = self.check(cluster, action).await?.map_err(Error::Precondition)?;

        let task = PowerActionInvoker::new(self.service.as_ref())
            .invoke(cluster, action.target_state())
            .await?;

        let outcome = TaskPoller::new(self.service.as_ref())
            .with_interval(self.settings.poll_interval)
            .with_observer(self.observer.clone())
            .poll_to_terminal(&task, &management)
            .await?;

        let finished_at = Utc::now();
        info!(
            cluster = %cluster,
            action = %action,
            task = %task,
            duration_ms = (finished_at - started_at).num_milliseconds(),
            "Power transition finished"
        );

        Ok(PowerReport {
            cluster: cluster.clone(),
            action,
            task,
            management,
            outcome,
            started_at,
            finished_at,
        })
    }

    /// Evaluate the gate for `action` without submitting anything
    pub async fn precheck(
        &self,
        cluster: &ClusterRef,
        action: PowerAction,
    ) -> Result<PrecheckReport> {
        let checked = self.check(cluster, action).await?;
        let (management, failure) = match checked {
            Ok(location) => (Some(location), None),
            Err(failure) => (None, Some(failure)),
        };

        Ok(PrecheckReport {
            cluster: cluster.clone(),
            action,
            passed: failure.is_none(),
            management,
            failure,
            checked_at: Utc::now(),
        })
    }

    async fn check(
        &self,
        cluster: &ClusterRef,
        action: PowerAction,
    ) -> Result<std::result::Result<ManagementLocation, PreconditionFailure>> {
        let evaluator = PreconditionEvaluator::new(self.service.as_ref())
            .with_category(self.settings.health_category.clone())
            .with_detector(SelfHostedDetector::new(self.settings.self_hosted_test_id.clone()));

        match action {
            PowerAction::PowerOff => Ok(match evaluator.evaluate_health_gate(cluster).await? {
                HealthGate::Pass(location) => Ok(location),
                HealthGate::Fail(failure) => Err(PreconditionFailure::Health(failure)),
            }),
            PowerAction::PowerOn => Ok(match evaluator.evaluate_connectivity_gate(cluster).await? {
                ConnectivityGate::Pass => Ok(ManagementLocation::NotSelfHosted),
                ConnectivityGate::Fail { disconnected } => {
                    Err(PreconditionFailure::Connectivity { disconnected })
                }
            }),
        }
    }
}
