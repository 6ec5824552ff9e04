//! Managed object reference tokens
//!
//! Health test detail rows identify objects with a colon-delimited token:
//! `<kind>:<objectTypeTag>:<objectType>:<objectId>`,
//! e.g. `mor:ManagedObjectReference:HostSystem:host-21`.

use hcipower_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Object type of a physical host
pub const HOST_SYSTEM_TYPE: &str = "HostSystem";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagedObjectRef {
    pub kind: String,
    pub object_type_tag: String,
    pub object_type: String,
    pub object_id: String,
}

impl ManagedObjectRef {
    /// Parse a reference token. The identifier keeps any further colons.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        let parts: Vec<&str> = token.splitn(4, ':').collect();

        if parts.len() != 4 || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(Error::MalformedReference(format!(
                "'{}' is not of the form <kind>:<objectTypeTag>:<objectType>:<objectId>",
                token
            )));
        }

        Ok(Self {
            kind: parts[0].trim().to_string(),
            object_type_tag: parts[1].trim().to_string(),
            object_type: parts[2].trim().to_string(),
            object_id: parts[3].trim().to_string(),
        })
    }

    pub fn is_host(&self) -> bool {
        self.object_type == HOST_SYSTEM_TYPE
    }
}

impl FromStr for ManagedObjectRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ManagedObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.kind, self.object_type_tag, self.object_type, self.object_id
        )
    }
}
