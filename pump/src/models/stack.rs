//! Stack and resource models

use serde::{Deserialize, Serialize};

/// Orchestration status of a stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StackStatus {
    CreateInProgress,
    CreateComplete,
    CreateFailed,
    UpdateInProgress,
    UpdateComplete,
    UpdateFailed,
    DeleteInProgress,
    DeleteComplete,
    DeleteFailed,
    RollbackInProgress,
    RollbackComplete,
    RollbackFailed,
    #[serde(other)]
    Unknown,
}

impl StackStatus {
    /// A completed status can no longer change; stacks in one of these
    /// states are safe to cache for the lifetime of a run.
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            StackStatus::CreateComplete
                | StackStatus::UpdateComplete
                | StackStatus::DeleteComplete
                | StackStatus::RollbackComplete
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            StackStatus::CreateFailed
                | StackStatus::UpdateFailed
                | StackStatus::DeleteFailed
                | StackStatus::RollbackFailed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StackStatus::CreateInProgress => "CREATE_IN_PROGRESS",
            StackStatus::CreateComplete => "CREATE_COMPLETE",
            StackStatus::CreateFailed => "CREATE_FAILED",
            StackStatus::UpdateInProgress => "UPDATE_IN_PROGRESS",
            StackStatus::UpdateComplete => "UPDATE_COMPLETE",
            StackStatus::UpdateFailed => "UPDATE_FAILED",
            StackStatus::DeleteInProgress => "DELETE_IN_PROGRESS",
            StackStatus::DeleteComplete => "DELETE_COMPLETE",
            StackStatus::DeleteFailed => "DELETE_FAILED",
            StackStatus::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            StackStatus::RollbackComplete => "ROLLBACK_COMPLETE",
            StackStatus::RollbackFailed => "ROLLBACK_FAILED",
            StackStatus::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for StackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stack as reported by the orchestration API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stack {
    /// Stack identifier
    pub id: String,

    /// Human-readable stack name
    #[serde(default)]
    pub stack_name: String,

    /// Current orchestration status
    pub stack_status: StackStatus,

    /// Parent stack identifier, absent for the root stack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// A link attached to a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// One managed resource within a stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Role-local, human-readable name
    pub resource_name: String,

    /// Stable identifier of the underlying managed object. Empty while the
    /// object has not been created yet.
    #[serde(default)]
    pub physical_resource_id: String,

    /// Resource type, e.g. 'OS::Nova::Server'
    pub resource_type: String,

    /// Name of the outer resource when this resource sits inside a nested
    /// stack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_resource: Option<String>,

    #[serde(default)]
    pub links: Vec<Link>,
}

impl Resource {
    /// The 'stack' link points at the stack owning this resource.
    pub fn stack_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "stack")
            .map(|l| l.href.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        let status: StackStatus = serde_json::from_str("\"CREATE_COMPLETE\"").unwrap();
        assert_eq!(status, StackStatus::CreateComplete);
        assert!(status.is_complete());
        assert!(!status.is_failed());

        let status: StackStatus = serde_json::from_str("\"CREATE_FAILED\"").unwrap();
        assert!(status.is_failed());

        let status: StackStatus = serde_json::from_str("\"SNAPSHOT_IN_PROGRESS\"").unwrap();
        assert_eq!(status, StackStatus::Unknown);
        assert!(!status.is_complete());
    }

    #[test]
    fn test_stack_link() {
        let resource = Resource {
            resource_name: "Controller".to_string(),
            physical_resource_id: "abc".to_string(),
            resource_type: "OS::Nova::Server".to_string(),
            parent_resource: None,
            links: vec![
                Link {
                    rel: "self".to_string(),
                    href: "http://heat/v1/t/stacks/oc/1/resources/Controller".to_string(),
                },
                Link {
                    rel: "stack".to_string(),
                    href: "http://heat/v1/t/stacks/oc/1".to_string(),
                },
            ],
        };
        assert_eq!(resource.stack_link(), Some("http://heat/v1/t/stacks/oc/1"));
    }
}
