//! Stack API endpoints

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::PumpError;
use crate::http::client::HeatClient;
use crate::http::StackClient;
use crate::models::deployment::ResourceMetadata;
use crate::models::stack::{Resource, Stack};

#[derive(Debug, Deserialize)]
struct StackEnvelope {
    stack: Stack,
}

#[derive(Debug, Deserialize)]
struct ResourceListEnvelope {
    resources: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct MetadataEnvelope {
    metadata: ResourceMetadata,
}

#[derive(Debug, Deserialize)]
struct ResourceEnvelope {
    resource: ResourceDetail,
}

#[derive(Debug, Deserialize)]
struct ResourceDetail {
    #[serde(default)]
    attributes: serde_json::Value,
}

#[async_trait]
impl StackClient for HeatClient {
    async fn get_stack(&self, stack_id: &str) -> Result<Stack, PumpError> {
        let path = format!("/stacks/{}", stack_id);
        let envelope: StackEnvelope = self.get(&path, &[]).await?;
        Ok(envelope.stack)
    }

    async fn list_resources(
        &self,
        stack_id: &str,
        type_filter: Option<&str>,
        nested_depth: Option<u32>,
    ) -> Result<Vec<Resource>, PumpError> {
        let path = format!("/stacks/{}/resources", stack_id);
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(rtype) = type_filter {
            query.push(("type", rtype.to_string()));
        }
        if let Some(depth) = nested_depth {
            query.push(("nested_depth", depth.to_string()));
        }
        let envelope: ResourceListEnvelope = self.get(&path, &query).await?;
        Ok(envelope.resources)
    }

    async fn resource_metadata(
        &self,
        stack_id: &str,
        resource_name: &str,
    ) -> Result<ResourceMetadata, PumpError> {
        let path = format!("/stacks/{}/resources/{}/metadata", stack_id, resource_name);
        let envelope: MetadataEnvelope = self.get(&path, &[]).await?;
        Ok(envelope.metadata)
    }

    async fn resource_attributes(
        &self,
        stack_id: &str,
        resource_name: &str,
    ) -> Result<serde_json::Value, PumpError> {
        let path = format!("/stacks/{}/resources/{}", stack_id, resource_name);
        let envelope: ResourceEnvelope = self.get(&path, &[]).await?;
        Ok(envelope.resource.attributes)
    }
}
