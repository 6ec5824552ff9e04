//! Self-hosted management detection
//!
//! When the management plane runs on a host inside the cluster, the power-off
//! precheck reports a yellow test with a known id. That finding is expected
//! and does not block power-off; its first detail row names the host that keeps
//! running the management plane until the very end.

use hcipower_common::{HealthGateFailure, HealthGroup, HealthSummary, HealthTest, Severity};
use tracing::debug;

use super::moref::ManagedObjectRef;

/// Test id reported when the management plane runs on the cluster it manages
pub const VC_ON_VSAN_TEST_ID: &str = "com.vmware.vsan.health.test.vconvsan";

/// Outcome of scanning a health summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Nothing disqualifying; carries the orchestration host when self-hosted
    Clear {
        orchestration_host: Option<ManagedObjectRef>,
    },
    Disqualified(HealthGateFailure),
}

pub struct SelfHostedDetector {
    signature: String,
}

impl Default for SelfHostedDetector {
    fn default() -> Self {
        Self::new(VC_ON_VSAN_TEST_ID)
    }
}

impl SelfHostedDetector {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
        }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Scan non-green groups and tests. Evaluation stops at the first
    /// disqualifying test.
    pub fn scan(&self, summary: &HealthSummary) -> Detection {
        let mut orchestration_host: Option<ManagedObjectRef> = None;

        for group in summary.failing_groups() {
            for test in group.tests.iter().filter(|t| !t.severity.is_green()) {
                if !self.is_expected(group, test) {
                    return Detection::Disqualified(HealthGateFailure::FailingTest {
                        group_id: group.id.clone(),
                        group_name: group.name.clone(),
                        test_id: test.id.clone(),
                        test_name: test.name.clone(),
                        severity: test.severity,
                    });
                }

                match extract_host(test) {
                    Ok(host) => {
                        if let Some(ref first) = orchestration_host {
                            debug!(
                                kept = %first,
                                ignored = %host,
                                "Self-hosted signature reported more than once"
                            );
                        } else {
                            debug!(host = %host, "Self-hosted management signature found");
                            orchestration_host = Some(host);
                        }
                    }
                    Err(reason) => {
                        return Detection::Disqualified(
                            HealthGateFailure::OrchestrationHostUnknown {
                                test_id: test.id.clone(),
                                reason,
                            },
                        );
                    }
                }
            }
        }

        Detection::Clear { orchestration_host }
    }

    fn is_expected(&self, group: &HealthGroup, test: &HealthTest) -> bool {
        group.severity == Severity::Yellow
            && test.severity == Severity::Yellow
            && test.id == self.signature
    }
}

fn extract_host(test: &HealthTest) -> Result<ManagedObjectRef, String> {
    let token = test
        .first_detail_value()
        .ok_or_else(|| "test carries no detail rows".to_string())?;

    let moref = ManagedObjectRef::parse(token).map_err(|e| e.to_string())?;

    if !moref.is_host() {
        return Err(format!(
            "expected a HostSystem reference, found {}",
            moref.object_type
        ));
    }

    Ok(moref)
}
