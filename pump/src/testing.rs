//! Scripted fake orchestration client for tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::PumpError;
use crate::http::StackClient;
use crate::models::deployment::{Deployment, ResourceMetadata};
use crate::models::stack::{Link, Resource, Stack, StackStatus};

#[derive(Default)]
struct FakeState {
    stacks: HashMap<String, Stack>,
    status_scripts: HashMap<String, VecDeque<StackStatus>>,
    resources: HashMap<String, Vec<Resource>>,
    // (stack key, physical id) hidden from listings until the stack has
    // been listed this many times
    hidden_until: HashMap<(String, String), u32>,
    metadata: HashMap<(String, String), Vec<Deployment>>,
    attributes: HashMap<(String, String), serde_json::Value>,
    get_stack_calls: HashMap<String, u32>,
    list_calls: HashMap<String, u32>,
}

/// A [`StackClient`] whose responses are scripted up front.
///
/// Status sequences are consumed one per `get_stack` call, with the last
/// value repeating forever.
#[derive(Default)]
pub struct FakeClient {
    state: Mutex<FakeState>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stack reachable under `key`, with its own id and a status
    /// script.
    pub fn add_stack_entry(
        &self,
        key: &str,
        id: &str,
        parent: Option<&str>,
        statuses: &[StackStatus],
    ) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.stacks.insert(
            key.to_string(),
            Stack {
                id: id.to_string(),
                stack_name: key.to_string(),
                stack_status: statuses[0],
                parent: parent.map(|p| p.to_string()),
            },
        );
        state
            .status_scripts
            .insert(key.to_string(), statuses.iter().copied().collect());
    }

    /// Register a stack whose key doubles as its id.
    pub fn add_stack(&self, key: &str, parent: Option<&str>, statuses: &[StackStatus]) {
        self.add_stack_entry(key, key, parent, statuses);
    }

    pub fn add_resource(&self, stack_key: &str, resource: Resource) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .resources
            .entry(stack_key.to_string())
            .or_default()
            .push(resource);
    }

    /// Keep a resource out of listings for the stack's first `calls` listing
    /// calls, mimicking nested-resource propagation lag.
    pub fn hide_resource_until(&self, stack_key: &str, physical_id: &str, calls: u32) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .hidden_until
            .insert((stack_key.to_string(), physical_id.to_string()), calls);
    }

    pub fn set_metadata(&self, stack_key: &str, resource_name: &str, deployments: Vec<Deployment>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .metadata
            .insert((stack_key.to_string(), resource_name.to_string()), deployments);
    }

    pub fn set_attributes(
        &self,
        stack_key: &str,
        resource_name: &str,
        attributes: serde_json::Value,
    ) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .attributes
            .insert((stack_key.to_string(), resource_name.to_string()), attributes);
    }

    pub fn get_stack_calls(&self, key: &str) -> u32 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.get_stack_calls.get(key).copied().unwrap_or(0)
    }

    pub fn list_calls(&self, key: &str) -> u32 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.list_calls.get(key).copied().unwrap_or(0)
    }

    /// A server-typed resource whose stack link ends in `stack_id`.
    pub fn resource(name: &str, physical_id: &str, stack_id: &str) -> Resource {
        Self::typed_resource(name, physical_id, stack_id, "OS::Nova::Server")
    }

    pub fn typed_resource(
        name: &str,
        physical_id: &str,
        stack_id: &str,
        resource_type: &str,
    ) -> Resource {
        Resource {
            resource_name: name.to_string(),
            physical_resource_id: physical_id.to_string(),
            resource_type: resource_type.to_string(),
            parent_resource: None,
            links: vec![Link {
                rel: "stack".to_string(),
                href: format!("http://heat.test/v1/tenant/stacks/fake/{}", stack_id),
            }],
        }
    }

    /// A deployment carrying the nested-deploy inputs the collector resolves
    /// locations from.
    pub fn nested_deployment(
        id: &str,
        creation_time: &str,
        deploy_stack_id: &str,
        deploy_resource_name: &str,
    ) -> Deployment {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "creation_time": creation_time,
            "inputs": [
                {"name": "deploy_stack_id", "value": deploy_stack_id},
                {"name": "deploy_resource_name", "value": deploy_resource_name},
            ],
        }))
        .unwrap()
    }
}

#[async_trait]
impl StackClient for FakeClient {
    async fn get_stack(&self, stack_id: &str) -> Result<Stack, PumpError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state.get_stack_calls.entry(stack_id.to_string()).or_insert(0) += 1;

        let status = {
            let script = state
                .status_scripts
                .get_mut(stack_id)
                .ok_or_else(|| PumpError::ApiError(format!("stack {} not found", stack_id)))?;
            if script.len() > 1 {
                script.pop_front().unwrap_or(StackStatus::Unknown)
            } else {
                script.front().copied().unwrap_or(StackStatus::Unknown)
            }
        };

        let mut stack = state
            .stacks
            .get(stack_id)
            .cloned()
            .ok_or_else(|| PumpError::ApiError(format!("stack {} not found", stack_id)))?;
        stack.stack_status = status;
        Ok(stack)
    }

    async fn list_resources(
        &self,
        stack_id: &str,
        type_filter: Option<&str>,
        _nested_depth: Option<u32>,
    ) -> Result<Vec<Resource>, PumpError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let calls = state
            .list_calls
            .entry(stack_id.to_string())
            .and_modify(|c| *c += 1)
            .or_insert(1);
        let calls = *calls;

        let listing = state.resources.get(stack_id).cloned().unwrap_or_default();
        let listing = listing
            .into_iter()
            .filter(|r| type_filter.is_none_or(|t| r.resource_type == t))
            .filter(|r| {
                state
                    .hidden_until
                    .get(&(stack_id.to_string(), r.physical_resource_id.clone()))
                    .is_none_or(|&until| calls > until)
            })
            .collect();
        Ok(listing)
    }

    async fn resource_metadata(
        &self,
        stack_id: &str,
        resource_name: &str,
    ) -> Result<ResourceMetadata, PumpError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let deployments = state
            .metadata
            .get(&(stack_id.to_string(), resource_name.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(ResourceMetadata { deployments })
    }

    async fn resource_attributes(
        &self,
        stack_id: &str,
        resource_name: &str,
    ) -> Result<serde_json::Value, PumpError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state
            .attributes
            .get(&(stack_id.to_string(), resource_name.to_string()))
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }
}
