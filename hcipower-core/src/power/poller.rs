//! Power task polling
//!
//! Polls the task status until it reaches a terminal state. Losing the status
//! endpoint is an expected outcome when the management plane powers itself
//! off along with the cluster; it ends polling without an inferred result.

use hcipower_common::{
    Error, HostRef, ManagementLocation, Result, TaskHandle, TaskState, TaskStatus,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::service::{StatusQueryError, TaskStatusQuery};

/// Delay between two status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Called with every polled status
pub type ProgressObserver = Arc<dyn Fn(&TaskStatus) + Send + Sync>;

/// Poller state machine; every state but `Polling` is terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollState {
    Polling,
    Succeeded,
    Failed { diagnostic: String },
    ObservabilityLost,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Polling)
    }

    /// Transition on a successfully polled status
    pub fn on_status(self, status: &TaskStatus) -> Self {
        if self.is_terminal() {
            return self;
        }

        if status.state == TaskState::Failed {
            return Self::Failed {
                diagnostic: status
                    .error
                    .clone()
                    .unwrap_or_else(|| "task reported failure without a diagnostic".to_string()),
            };
        }

        if status.progress() >= 100 || status.state == TaskState::Succeeded {
            return Self::Succeeded;
        }

        Self::Polling
    }

    /// Transition on an unreachable status endpoint
    pub fn on_unreachable(self) -> Self {
        if self.is_terminal() {
            return self;
        }
        Self::ObservabilityLost
    }
}

/// How polling ended, short of a task failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PollOutcome {
    Succeeded {
        polls: u32,
    },
    /// The status endpoint went away; the task may still be running
    ObservabilityLost {
        watch_host: Option<HostRef>,
        last_progress: Option<u8>,
    },
}

pub struct TaskPoller<'a, S: ?Sized> {
    service: &'a S,
    interval: Duration,
    observer: Option<ProgressObserver>,
}

impl<'a, S> TaskPoller<'a, S>
where
    S: TaskStatusQuery + ?Sized,
{
    pub fn new(service: &'a S) -> Self {
        Self {
            service,
            interval: DEFAULT_POLL_INTERVAL,
            observer: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_observer(mut self, observer: Option<ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Poll until a terminal state. `management` decides the guidance given
    /// when the status endpoint disappears.
    pub async fn poll_to_terminal(
        &self,
        task: &TaskHandle,
        management: &ManagementLocation,
    ) -> Result<PollOutcome> {
        let mut state = PollState::Polling;
        let mut polls: u32 = 0;
        let mut last_progress: Option<u8> = None;

        loop {
            polls += 1;

            match self.service.query_task_status(task).await {
                Ok(status) => {
                    debug!(
                        task = %task,
                        state = ?status.state,
                        progress = status.progress(),
                        "Polled task status"
                    );
                    if let Some(ref observer) = self.observer {
                        observer(&status);
                    }
                    last_progress = Some(status.progress());
                    state = state.on_status(&status);
                }
                Err(StatusQueryError::Unreachable(reason)) => {
                    warn!(task = %task, reason = %reason, "Task status endpoint unreachable");
                    state = state.on_unreachable();
                }
                Err(StatusQueryError::Other(reason)) => {
                    error!(task = %task, reason = %reason, "Task status query failed");
                    return Err(Error::StatusQuery {
                        task: task.clone(),
                        message: reason,
                    });
                }
            }

            match state {
                PollState::Polling => tokio::time::sleep(self.interval).await,
                PollState::Succeeded => {
                    info!(task = %task, polls, "Power task completed");
                    return Ok(PollOutcome::Succeeded { polls });
                }
                PollState::Failed { diagnostic } => {
                    error!(task = %task, diagnostic = %diagnostic, "Power task failed");
                    return Err(Error::TaskFailure {
                        task: task.clone(),
                        diagnostic,
                    });
                }
                PollState::ObservabilityLost => {
                    let watch_host = management.orchestration_host().cloned();
                    match watch_host {
                        Some(ref host) => info!(
                            task = %task,
                            host = %host,
                            "Management plane is going down with the cluster; \
                             continue monitoring from the orchestration host"
                        ),
                        None => {
                            info!(task = %task, "Lost sight of the power task; outcome unknown")
                        }
                    }
                    return Ok(PollOutcome::ObservabilityLost {
                        watch_host,
                        last_progress,
                    });
                }
            }
        }
    }
}
