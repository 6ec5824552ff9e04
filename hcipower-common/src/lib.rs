//! Common types shared between hcipower-core and hcipower-cli

pub mod health;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use health::{DetailRow, HealthGateFailure, HealthGroup, HealthSummary, HealthTest, Severity};

/// Identifier of the cluster being powered off or on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterRef(String);

impl ClusterRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host reference as known to the management plane
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostRef {
    pub object_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl HostRef {
    pub fn new(object_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            id: id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.id),
            None => f.write_str(&self.id),
        }
    }
}

/// Where the cluster management plane runs, relative to the target cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "location", content = "host", rename_all = "snake_case")]
pub enum ManagementLocation {
    NotSelfHosted,
    SelfHostedOn(HostRef),
}

impl ManagementLocation {
    /// Host to watch once the management plane stops answering
    pub fn orchestration_host(&self) -> Option<&HostRef> {
        match self {
            Self::NotSelfHosted => None,
            Self::SelfHostedOn(host) => Some(host),
        }
    }
}

/// Requested cluster power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerState {
    PoweredOff,
    PoweredOn,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoweredOff => write!(f, "poweredOff"),
            Self::PoweredOn => write!(f, "poweredOn"),
        }
    }
}

/// Operator-requested action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    PowerOff,
    PowerOn,
}

impl PowerAction {
    pub fn target_state(&self) -> PowerState {
        match self {
            Self::PowerOff => PowerState::PoweredOff,
            Self::PowerOn => PowerState::PoweredOn,
        }
    }
}

impl FromStr for PowerAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "poweroff" | "power-off" => Ok(Self::PowerOff),
            "poweron" | "power-on" => Ok(Self::PowerOn),
            other => Err(Error::Input(format!(
                "unknown action '{}', expected 'poweroff' or 'poweron'",
                other
            ))),
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerOff => write!(f, "poweroff"),
            Self::PowerOn => write!(f, "poweron"),
        }
    }
}

/// Body of a power action submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerActionRequest {
    pub target_state: PowerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PowerActionRequest {
    pub fn power_off(reason: impl Into<String>) -> Self {
        Self {
            target_state: PowerState::PoweredOff,
            reason: Some(reason.into()),
        }
    }

    pub fn power_on() -> Self {
        Self {
            target_state: PowerState::PoweredOn,
            reason: None,
        }
    }
}

/// Opaque handle of an asynchronous power task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State reported by the backing task service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Snapshot of a power task's progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(default, deserialize_with = "deserialize_percent")]
    pub percent_complete: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStatus {
    pub fn running(percent_complete: u8) -> Self {
        Self {
            state: TaskState::Running,
            percent_complete,
            error: None,
        }
    }

    pub fn succeeded() -> Self {
        Self {
            state: TaskState::Succeeded,
            percent_complete: 100,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            state: TaskState::Failed,
            percent_complete: 0,
            error: Some(error.into()),
        }
    }

    /// Progress clamped to 0..=100
    pub fn progress(&self) -> u8 {
        self.percent_complete.min(100)
    }
}

/// Progress as sent by task services: null, fractional or out of range
fn deserialize_percent<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite())
        .map_or(0, |v| v.clamp(0.0, 100.0).round() as u8))
}

/// Why a gate refused a power transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum PreconditionFailure {
    Health(HealthGateFailure),
    Connectivity { disconnected: Vec<HostRef> },
}

impl fmt::Display for PreconditionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Health(failure) => write!(f, "health check failed: {}", failure),
            Self::Connectivity { disconnected } => {
                let hosts: Vec<String> = disconnected.iter().map(|h| h.to_string()).collect();
                write!(
                    f,
                    "{} host(s) disconnected: {}",
                    disconnected.len(),
                    hosts.join(", ")
                )
            }
        }
    }
}

/// Orchestration error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Precondition failed: {0}")]
    Precondition(PreconditionFailure),

    #[error("Power action submission rejected: {0}")]
    Invocation(String),

    #[error("Task {task} failed: {diagnostic}")]
    TaskFailure { task: TaskHandle, diagnostic: String },

    #[error("Status query for task {task} failed: {message}")]
    StatusQuery { task: TaskHandle, message: String },

    #[error("Service error: {0}")]
    Service(String),

    #[error("Malformed health payload: {0}")]
    MalformedPayload(String),

    #[error("Malformed object reference: {0}")]
    MalformedReference(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_action_parsing() {
        assert_eq!("poweroff".parse::<PowerAction>().unwrap(), PowerAction::PowerOff);
        assert_eq!("Power-On".parse::<PowerAction>().unwrap(), PowerAction::PowerOn);
        assert!(matches!("reboot".parse::<PowerAction>(), Err(Error::Input(_))));
    }

    #[test]
    fn test_power_off_request_carries_reason() {
        let request = PowerActionRequest::power_off("maintenance");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["targetState"], "poweredOff");
        assert_eq!(json["reason"], "maintenance");
    }

    #[test]
    fn test_power_on_request_omits_reason() {
        let json = serde_json::to_value(PowerActionRequest::power_on()).unwrap();
        assert_eq!(json["targetState"], "poweredOn");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn test_task_status_unknown_state() {
        let status: TaskStatus =
            serde_json::from_str(r#"{"state": "queued", "percentComplete": 5}"#).unwrap();
        assert_eq!(status.state, TaskState::Unknown);
        assert_eq!(status.progress(), 5);
    }

    #[test]
    fn test_task_status_null_progress() {
        let status: TaskStatus =
            serde_json::from_str(r#"{"state": "running", "percentComplete": null}"#).unwrap();
        assert_eq!(status.state, TaskState::Running);
        assert_eq!(status.progress(), 0);
    }

    #[test]
    fn test_task_status_fractional_progress() {
        let status: TaskStatus =
            serde_json::from_str(r#"{"state": "running", "percentComplete": 42.5}"#).unwrap();
        assert_eq!(status.progress(), 43);

        let status: TaskStatus =
            serde_json::from_str(r#"{"state": "running", "percentComplete": 250}"#).unwrap();
        assert_eq!(status.progress(), 100);

        let status: TaskStatus =
            serde_json::from_str(r#"{"state": "running", "percentComplete": -3}"#).unwrap();
        assert_eq!(status.progress(), 0);
    }

    #[test]
    fn test_task_status_missing_progress() {
        let status: TaskStatus = serde_json::from_str(r#"{"state": "succeeded"}"#).unwrap();
        assert_eq!(status.state, TaskState::Succeeded);
        assert_eq!(status.percent_complete, 0);
    }

    #[test]
    fn test_connectivity_failure_lists_hosts() {
        let failure = PreconditionFailure::Connectivity {
            disconnected: vec![
                HostRef::new("HostSystem", "host-9").with_name("esx-9"),
                HostRef::new("HostSystem", "host-12"),
            ],
        };
        assert_eq!(
            failure.to_string(),
            "2 host(s) disconnected: esx-9 (host-9), host-12"
        );
    }
}
