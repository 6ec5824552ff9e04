//! Power action submission and task tracking

pub mod poller;

use hcipower_common::{ClusterRef, Error, PowerActionRequest, PowerState, Result, TaskHandle};
use tracing::{error, info};

use crate::service::PowerActions;

pub use poller::{PollOutcome, PollState, ProgressObserver, TaskPoller, DEFAULT_POLL_INTERVAL};

/// Reason attached to every cluster power-off
pub const MAINTENANCE_REASON: &str = "Planned cluster maintenance";

/// Build the request for a target state
pub fn power_request(target: PowerState) -> PowerActionRequest {
    match target {
        PowerState::PoweredOff => PowerActionRequest::power_off(MAINTENANCE_REASON),
        PowerState::PoweredOn => PowerActionRequest::power_on(),
    }
}

/// Submits power actions. Never retries.
pub struct PowerActionInvoker<'a, S: ?Sized> {
    service: &'a S,
}

impl<'a, S> PowerActionInvoker<'a, S>
where
    S: PowerActions + ?Sized,
{
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Submit the action and return as soon as the backend accepts it
    pub async fn invoke(&self, cluster: &ClusterRef, target: PowerState) -> Result<TaskHandle> {
        let request = power_request(target);

        info!(
            cluster = %cluster,
            target = %target,
            reason = request.reason.as_deref().unwrap_or("-"),
            "Submitting power action"
        );

        match self.service.submit_power_action(cluster, &request).await {
            Ok(task) => {
                info!(cluster = %cluster, task = %task, "Power action accepted");
                Ok(task)
            }
            Err(e) => {
                error!(cluster = %cluster, error = %e, "Power action rejected");
                Err(match e {
                    Error::Invocation(message) => Error::Invocation(message),
                    other => Error::Invocation(other.to_string()),
                })
            }
        }
    }
}
