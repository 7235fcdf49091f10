//! Orchestration API access

pub mod client;
pub mod stacks;

use async_trait::async_trait;

use crate::errors::PumpError;
use crate::models::deployment::ResourceMetadata;
use crate::models::stack::{Resource, Stack};

/// Read-only view of the orchestration API consumed by the collector.
///
/// Injected everywhere a remote call is made so the cache, resolver and
/// collector can be driven by a scripted fake in tests.
#[async_trait]
pub trait StackClient: Send + Sync {
    async fn get_stack(&self, stack_id: &str) -> Result<Stack, PumpError>;

    async fn list_resources(
        &self,
        stack_id: &str,
        type_filter: Option<&str>,
        nested_depth: Option<u32>,
    ) -> Result<Vec<Resource>, PumpError>;

    async fn resource_metadata(
        &self,
        stack_id: &str,
        resource_name: &str,
    ) -> Result<ResourceMetadata, PumpError>;

    async fn resource_attributes(
        &self,
        stack_id: &str,
        resource_name: &str,
    ) -> Result<serde_json::Value, PumpError>;
}
