//! Deployment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::PumpError;

/// One named input of a deployment record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentInput {
    pub name: String,

    #[serde(default)]
    pub value: serde_json::Value,

    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// A software-deployment record reported by the metadata endpoint for one
/// server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Unique deployment ID
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Creation timestamp; orders deployments within a step
    #[serde(with = "api_time")]
    pub creation_time: DateTime<Utc>,

    #[serde(default)]
    pub inputs: Vec<DeploymentInput>,

    /// Remaining record fields (group, config, options, outputs, ...)
    #[serde(flatten)]
    pub extra: serde_json::Value,

    /// Resource names from the top-level stack down to this deployment,
    /// filled in once by the path resolver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<Vec<String>>,
}

impl Deployment {
    /// Value of the first input with the given name, when it is a string.
    pub fn input_value(&self, name: &str) -> Option<&str> {
        self.inputs
            .iter()
            .find(|i| i.name == name)
            .and_then(|i| i.value.as_str())
    }

    /// Identifier of the nested stack this deployment was defined in.
    ///
    /// The input value arrives as `<stack name>/<id>`; the bare id is the
    /// canonical stack identifier throughout the collector.
    pub fn deploy_stack_id(&self) -> Result<&str, PumpError> {
        self.input_value("deploy_stack_id")
            .map(|v| v.rsplit('/').next().unwrap_or(v))
            .ok_or_else(|| {
                PumpError::DeploymentError(
                    self.id.clone(),
                    "missing deploy_stack_id input".to_string(),
                )
            })
    }

    /// Name of the deployment resource within its nested stack.
    pub fn deploy_resource_name(&self) -> Result<&str, PumpError> {
        self.input_value("deploy_resource_name").ok_or_else(|| {
            PumpError::DeploymentError(
                self.id.clone(),
                "missing deploy_resource_name input".to_string(),
            )
        })
    }
}

/// Metadata attached to a server resource
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceMetadata {
    #[serde(default)]
    pub deployments: Vec<Deployment>,
}

/// The orchestration API emits both RFC 3339 timestamps and the naive
/// `%Y-%m-%dT%H:%M:%S` form, depending on version.
mod api_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|n| n.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
