use crate::commands::print_precondition_failure;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use hcipower_common::{ClusterRef, ManagementLocation, PowerAction};
use hcipower_core::service::ManagementPlane;
use hcipower_core::Orchestrator;

pub async fn handle_precheck_command<S: ManagementPlane + ?Sized>(
    orchestrator: &Orchestrator<S>,
    cluster: &ClusterRef,
    action: &str,
    output_format: &str,
) -> Result<()> {
    let action: PowerAction = action.parse()?;
    let format = OutputFormat::from_str(output_format);

    let report = orchestrator
        .precheck(cluster, action)
        .await
        .with_context(|| format!("could not evaluate the {} precheck", action))?;

    if format != OutputFormat::Table {
        output::print_single(&report, format)?;
    } else if let Some(ref failure) = report.failure {
        print_precondition_failure(failure, format)?;
    } else {
        output::print_success(&format!(
            "Cluster '{}' is ready for {}",
            cluster, action
        ));
        if let Some(ManagementLocation::SelfHostedOn(host)) = &report.management {
            output::print_info(&format!(
                "The management service runs inside the cluster on host {}; \
                 watch that host once the service stops answering",
                host
            ));
        }
    }

    if !report.passed {
        anyhow::bail!("{} precheck failed for cluster '{}'", action, cluster);
    }

    Ok(())
}
