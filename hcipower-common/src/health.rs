//! Health summary model for the cluster power-off precheck

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health severity as reported by the health service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Yellow,
    Red,
}

impl Severity {
    pub fn is_green(&self) -> bool {
        *self == Severity::Green
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Yellow => write!(f, "yellow"),
            Self::Red => write!(f, "red"),
        }
    }
}

/// One row of a test's detail tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRow {
    pub values: Vec<String>,
}

/// A single health test result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthTest {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    #[serde(default)]
    pub details: Vec<DetailRow>,
}

impl HealthTest {
    /// First value of the first detail row
    pub fn first_detail_value(&self) -> Option<&str> {
        self.details
            .first()
            .and_then(|row| row.values.first())
            .map(String::as_str)
    }
}

/// A group of related health tests with an aggregate severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthGroup {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    #[serde(default)]
    pub tests: Vec<HealthTest>,
}

/// Parsed health summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub groups: Vec<HealthGroup>,
}

impl HealthSummary {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups whose aggregate severity is not green
    pub fn failing_groups(&self) -> impl Iterator<Item = &HealthGroup> {
        self.groups.iter().filter(|g| !g.severity.is_green())
    }
}

/// Reason the health gate refused a power-off
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthGateFailure {
    /// A non-green test outside the expected self-hosted signature
    FailingTest {
        group_id: String,
        group_name: String,
        test_id: String,
        test_name: String,
        severity: Severity,
    },
    /// The self-hosted signature matched but its host could not be determined
    OrchestrationHostUnknown { test_id: String, reason: String },
}

impl fmt::Display for HealthGateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailingTest {
                group_name,
                test_name,
                test_id,
                severity,
                ..
            } => write!(
                f,
                "test '{}' ({}) in group '{}' is {}",
                test_name, test_id, group_name, severity
            ),
            Self::OrchestrationHostUnknown { test_id, reason } => write!(
                f,
                "cannot determine orchestration host from test {}: {}",
                test_id, reason
            ),
        }
    }
}
