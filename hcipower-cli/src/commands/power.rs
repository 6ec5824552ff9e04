use crate::commands::print_precondition_failure;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use dialoguer::Confirm;
use hcipower_common::{ClusterRef, Error, PowerAction, TaskStatus};
use hcipower_core::power::PollOutcome;
use hcipower_core::service::ManagementPlane;
use hcipower_core::{Orchestrator, PowerReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Ask on the terminal before a power-off
pub fn prompt_confirmation(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// Stand-in for `prompt_confirmation` when `--yes` was given
pub fn assume_yes(_prompt: &str) -> Result<bool> {
    Ok(true)
}

/// Run a power transition. `confirm` is only asked for power-off; declining
/// returns `Ok` without touching the management plane.
pub async fn handle_power_command<S, F>(
    orchestrator: Orchestrator<S>,
    cluster: &ClusterRef,
    action: PowerAction,
    confirm: F,
    output_format: &str,
) -> Result<()>
where
    S: ManagementPlane + ?Sized,
    F: FnOnce(&str) -> Result<bool>,
{
    let format = OutputFormat::from_str(output_format);

    if action == PowerAction::PowerOff {
        let prompt = format!(
            "Power off every host of cluster '{}'? Workloads on it will stop",
            cluster
        );
        if !confirm(&prompt)? {
            output::print_info("Power-off aborted");
            return Ok(());
        }
    }

    let progress = if format == OutputFormat::Table {
        Some(progress_bar(action))
    } else {
        None
    };

    let orchestrator = match progress {
        Some(ref pb) => {
            let pb = pb.clone();
            orchestrator.with_observer(Arc::new(move |status: &TaskStatus| {
                pb.set_position(u64::from(status.progress()));
            }))
        }
        None => orchestrator,
    };

    let result = orchestrator.execute(cluster, action).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match result {
        Ok(report) => print_report(&report, format),
        Err(Error::Precondition(failure)) => {
            print_precondition_failure(&failure, format)?;
            Err(Error::Precondition(failure))
                .with_context(|| format!("{} of cluster '{}' aborted", action, cluster))
        }
        Err(e) => Err(e).with_context(|| format!("{} of cluster '{}' failed", action, cluster)),
    }
}

fn progress_bar(action: PowerAction) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_message(match action {
        PowerAction::PowerOff => "Powering off",
        PowerAction::PowerOn => "Powering on",
    });
    pb
}

fn print_report(report: &PowerReport, format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Table {
        return output::print_single(report, format);
    }

    let elapsed = (report.finished_at - report.started_at)
        .to_std()
        .unwrap_or_default();
    let verb = match report.action {
        PowerAction::PowerOff => "powered off",
        PowerAction::PowerOn => "powered on",
    };

    match &report.outcome {
        PollOutcome::Succeeded { .. } => {
            output::print_success(&format!(
                "Cluster '{}' {} in {} (task {})",
                report.cluster,
                verb,
                output::format_elapsed(elapsed),
                report.task
            ));
        }
        PollOutcome::ObservabilityLost {
            watch_host,
            last_progress,
        } => {
            let seen = last_progress
                .map(|p| format!(" at {}%", p))
                .unwrap_or_default();
            output::print_warning(&format!(
                "Lost contact with the management service while task {} was running{}",
                report.task, seen
            ));
            match watch_host {
                Some(host) => output::print_info(&format!(
                    "The management service runs on host {}; \
                     continue monitoring the {} from that host directly",
                    host, report.action
                )),
                None => output::print_info(
                    "The task outcome is unknown; \
                     check the cluster state once the management service is back",
                ),
            }
        }
    }
    Ok(())
}
