//! Health summary payload parsing
//!
//! The only place that knows the wire shape of the health service. Missing
//! or null lists normalize to empty; anything else that does not fit is fatal.

use hcipower_common::{DetailRow, Error, HealthGroup, HealthSummary, HealthTest, Result, Severity};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSummary {
    #[serde(default)]
    groups: Option<Vec<RawGroup>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGroup {
    group_id: String,
    #[serde(default)]
    group_name: Option<String>,
    group_health: Severity,
    #[serde(default)]
    group_tests: Option<Vec<RawTest>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTest {
    test_id: String,
    #[serde(default)]
    test_name: Option<String>,
    test_health: Severity,
    #[serde(default)]
    test_details: Option<Vec<RawDetailTable>>,
}

#[derive(Debug, Deserialize)]
struct RawDetailTable {
    #[serde(default)]
    rows: Option<Vec<RawRow>>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    values: Option<Vec<Value>>,
}

/// Parse a raw health summary payload
pub fn parse_health_summary(raw: &Value) -> Result<HealthSummary> {
    if raw.is_null() {
        return Ok(HealthSummary::default());
    }

    let summary = RawSummary::deserialize(raw)
        .map_err(|e| Error::MalformedPayload(e.to_string()))?;

    Ok(summary.normalize())
}

/// Parse a health summary from its JSON text
pub fn parse_health_summary_str(raw: &str) -> Result<HealthSummary> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| Error::MalformedPayload(e.to_string()))?;
    parse_health_summary(&value)
}

impl RawSummary {
    fn normalize(self) -> HealthSummary {
        HealthSummary {
            groups: self
                .groups
                .unwrap_or_default()
                .into_iter()
                .map(RawGroup::normalize)
                .collect(),
        }
    }
}

impl RawGroup {
    fn normalize(self) -> HealthGroup {
        HealthGroup {
            name: self.group_name.unwrap_or_else(|| self.group_id.clone()),
            id: self.group_id,
            severity: self.group_health,
            tests: self
                .group_tests
                .unwrap_or_default()
                .into_iter()
                .map(RawTest::normalize)
                .collect(),
        }
    }
}

impl RawTest {
    fn normalize(self) -> HealthTest {
        // Detail tables are flattened in order; only row order matters downstream
        let details = self
            .test_details
            .unwrap_or_default()
            .into_iter()
            .flat_map(|table| table.rows.unwrap_or_default())
            .map(|row| DetailRow {
                values: row
                    .values
                    .unwrap_or_default()
                    .into_iter()
                    .map(value_to_string)
                    .collect(),
            })
            .collect();

        HealthTest {
            name: self.test_name.unwrap_or_else(|| self.test_id.clone()),
            id: self.test_id,
            severity: self.test_health,
            details,
        }
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
