//! Server model and deployment bookkeeping

use std::collections::{BTreeMap, HashSet};

use tracing::debug;
use url::Url;

use crate::errors::PumpError;
use crate::http::StackClient;
use crate::models::deployment::Deployment;
use crate::models::stack::Resource;

/// Server resources of this type are indexed members of a server group; the
/// group name carried by the parent resource is the role.
pub const DEPLOYED_SERVER_TYPE: &str = "OS::Heat::DeployedServer";

/// Role name for a server resource.
pub fn derive_role_name(resource_type: &str, name: &str, parent_resource: Option<&str>) -> String {
    match resource_type {
        DEPLOYED_SERVER_TYPE => parent_resource.unwrap_or(name).to_string(),
        _ => name.to_string(),
    }
}

/// A discovered server and the deployments recorded against it
#[derive(Debug, Clone)]
pub struct Server {
    name: String,
    physical_resource_id: String,
    role: String,
    resource: Resource,
    deployments: BTreeMap<u32, Vec<Deployment>>,
    seen: HashSet<String>,
    parent_stack_id: Option<String>,
    display_name: Option<String>,
}

impl Server {
    pub fn from_resource(resource: Resource) -> Self {
        let role = derive_role_name(
            &resource.resource_type,
            &resource.resource_name,
            resource.parent_resource.as_deref(),
        );
        Self {
            name: resource.resource_name.clone(),
            physical_resource_id: resource.physical_resource_id.clone(),
            role,
            resource,
            deployments: BTreeMap::new(),
            seen: HashSet::new(),
            parent_stack_id: None,
            display_name: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.physical_resource_id
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn deployments(&self) -> &BTreeMap<u32, Vec<Deployment>> {
        &self.deployments
    }

    /// Display name resolved from resource attributes, falling back to the
    /// resource name until (or unless) resolved.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// URL of the stack owning this server's resource.
    pub fn stack_url(&self) -> Result<&str, PumpError> {
        self.resource.stack_link().ok_or_else(|| {
            PumpError::ApiError(format!("resource {} has no stack link", self.name))
        })
    }

    /// Identifier of the stack owning this server's resource, taken from the
    /// final path segment of the stack link. Computed once per server.
    pub fn parent_stack_id(&mut self) -> Result<String, PumpError> {
        if self.parent_stack_id.is_none() {
            let url = Url::parse(self.stack_url()?)?;
            let id = url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| {
                    PumpError::ApiError(format!("stack link for {} has no path", self.name))
                })?
                .to_string();
            self.parent_stack_id = Some(id);
        }
        Ok(self.parent_stack_id.clone().unwrap_or_default())
    }

    pub fn knows_deployment(&self, deployment_id: &str) -> bool {
        self.seen.contains(deployment_id)
    }

    /// Record a deployment under the given step. A deployment id already
    /// known to this server is ignored, whatever step it was first seen at;
    /// the step's list is kept sorted by creation timestamp.
    pub fn record_deployment(&mut self, deployment: Deployment, step: u32) -> bool {
        if !self.seen.insert(deployment.id.clone()) {
            return false;
        }
        let step_deployments = self.deployments.entry(step).or_default();
        step_deployments.push(deployment);
        step_deployments.sort_by_key(|d| d.creation_time);
        true
    }

    /// Fetch the server's display name from its resource attributes.
    /// Computed at most once per server.
    pub async fn resolve_display_name(
        &mut self,
        client: &dyn StackClient,
    ) -> Result<(), PumpError> {
        if self.display_name.is_some() {
            return Ok(());
        }
        let stack_id = self.parent_stack_id()?;
        let attributes = client.resource_attributes(&stack_id, &self.name).await?;
        let display = attributes
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.name)
            .to_string();
        self.display_name = Some(display);
        Ok(())
    }
}

/// Discovered servers keyed by physical resource id
#[derive(Debug, Clone, Default)]
pub struct ServerSet {
    servers: BTreeMap<String, Server>,
}

impl ServerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotently insert a server for the given resource. Resources whose
    /// physical object does not exist yet carry an empty physical id and are
    /// skipped; a later poll picks them up.
    pub fn register(&mut self, resource: Resource) -> bool {
        if resource.physical_resource_id.is_empty() {
            debug!(
                resource = %resource.resource_name,
                "resource has no physical id yet, skipping"
            );
            return false;
        }
        if self.servers.contains_key(&resource.physical_resource_id) {
            return false;
        }
        let server = Server::from_resource(resource);
        self.servers.insert(server.id().to_string(), server);
        true
    }

    pub fn get(&self, physical_id: &str) -> Option<&Server> {
        self.servers.get(physical_id)
    }

    pub fn get_mut(&mut self, physical_id: &str) -> Option<&mut Server> {
        self.servers.get_mut(physical_id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.servers.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Server> {
        self.servers.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Server> {
        self.servers.values_mut()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stack::Link;

    fn server_resource(name: &str, physical_id: &str) -> Resource {
        Resource {
            resource_name: name.to_string(),
            physical_resource_id: physical_id.to_string(),
            resource_type: "OS::Nova::Server".to_string(),
            parent_resource: None,
            links: vec![Link {
                rel: "stack".to_string(),
                href: "http://heat/v1/t/stacks/overcloud/stack-1".to_string(),
            }],
        }
    }

    fn deployment(id: &str, creation_time: &str) -> Deployment {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "creation_time": creation_time,
        }))
        .unwrap()
    }

    #[test]
    fn test_derive_role_name() {
        assert_eq!(
            derive_role_name("OS::Nova::Server", "Controller", None),
            "Controller"
        );
        assert_eq!(
            derive_role_name(DEPLOYED_SERVER_TYPE, "0", Some("Compute")),
            "Compute"
        );
        assert_eq!(derive_role_name(DEPLOYED_SERVER_TYPE, "0", None), "0");
    }

    #[test]
    fn test_register_idempotent() {
        let mut servers = ServerSet::new();
        assert!(servers.register(server_resource("Controller", "phys-1")));
        assert!(!servers.register(server_resource("Controller", "phys-1")));
        assert_eq!(servers.len(), 1);
    }

    #[test]
    fn test_register_skips_missing_physical_id() {
        let mut servers = ServerSet::new();
        assert!(!servers.register(server_resource("Controller", "")));
        assert!(servers.is_empty());
    }

    #[test]
    fn test_record_deployment_dedup_across_steps() {
        let mut server = Server::from_resource(server_resource("Controller", "phys-1"));
        assert!(server.record_deployment(deployment("dep-1", "2026-01-01T00:00:00"), 0));
        // re-observed on a later poll
        assert!(!server.record_deployment(deployment("dep-1", "2026-01-01T00:00:00"), 1));

        assert_eq!(server.deployments().len(), 1);
        assert_eq!(server.deployments()[&0].len(), 1);
    }

    #[test]
    fn test_step_deployments_sorted_by_creation_time() {
        let mut server = Server::from_resource(server_resource("Controller", "phys-1"));
        server.record_deployment(deployment("dep-b", "2026-01-01T00:00:10"), 0);
        server.record_deployment(deployment("dep-a", "2026-01-01T00:00:05"), 0);
        server.record_deployment(deployment("dep-c", "2026-01-01T00:00:20"), 0);

        let ids: Vec<&str> = server.deployments()[&0]
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["dep-a", "dep-b", "dep-c"]);
    }

    #[test]
    fn test_parent_stack_id_from_link() {
        let mut server = Server::from_resource(server_resource("Controller", "phys-1"));
        assert_eq!(server.parent_stack_id().unwrap(), "stack-1");
        // memoized value survives repeated calls
        assert_eq!(server.parent_stack_id().unwrap(), "stack-1");
    }
}
