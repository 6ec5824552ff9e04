pub mod power;
pub mod precheck;

#[cfg(test)]
mod fake;

use crate::output::{self, OutputFormat};
use anyhow::Result;
use hcipower_common::{HostRef, PreconditionFailure};
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
struct HostRow {
    id: String,
    name: String,
    #[tabled(rename = "type")]
    object_type: String,
}

impl From<&HostRef> for HostRow {
    fn from(host: &HostRef) -> Self {
        Self {
            id: host.id.clone(),
            name: host.name.clone().unwrap_or_else(|| "-".to_string()),
            object_type: host.object_type.clone(),
        }
    }
}

/// Print the details of a failed gate
pub(crate) fn print_precondition_failure(
    failure: &PreconditionFailure,
    format: OutputFormat,
) -> Result<()> {
    if format != OutputFormat::Table {
        return output::print_single(failure, format);
    }

    match failure {
        PreconditionFailure::Health(reason) => {
            output::print_warning(&format!("Health precheck failed: {}", reason));
            output::print_info("Resolve the reported health issue, then retry the power-off");
        }
        PreconditionFailure::Connectivity { disconnected } => {
            output::print_warning(&format!(
                "{} host(s) are not reachable by the management service:",
                disconnected.len()
            ));
            let rows: Vec<HostRow> = disconnected.iter().map(HostRow::from).collect();
            output::print_output(rows, format)?;
            output::print_info("Reconnect the listed hosts, then retry the power-on");
        }
    }
    Ok(())
}
