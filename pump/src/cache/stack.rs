//! Stack and resource-listing cache
//!
//! A stack whose status is a completed state can never change again, so it
//! and its resource listing are served from memory for the rest of the run.
//! Anything still in progress is re-fetched on every call.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::errors::PumpError;
use crate::http::StackClient;
use crate::models::stack::{Resource, Stack};

/// In-memory cache in front of a [`StackClient`]
pub struct StackCache {
    client: Arc<dyn StackClient>,
    stacks: RwLock<HashMap<String, Stack>>,
    resources: RwLock<HashMap<String, Vec<Resource>>>,
}

impl StackCache {
    /// Create a new cache over the given client
    pub fn new(client: Arc<dyn StackClient>) -> Self {
        Self {
            client,
            stacks: RwLock::new(HashMap::new()),
            resources: RwLock::new(HashMap::new()),
        }
    }

    /// Get a stack, from cache when its status was already seen completed.
    ///
    /// Remote failures propagate uncached.
    pub async fn get_stack(&self, stack_id: &str) -> Result<Stack, PumpError> {
        {
            let stacks = self.stacks.read().unwrap_or_else(|e| e.into_inner());
            if let Some(stack) = stacks.get(stack_id) {
                return Ok(stack.clone());
            }
        }

        let stack = self.client.get_stack(stack_id).await?;
        if stack.stack_status.is_complete() {
            let mut stacks = self.stacks.write().unwrap_or_else(|e| e.into_inner());
            stacks.insert(stack_id.to_string(), stack.clone());
        }
        Ok(stack)
    }

    /// Resource listing for a stack. Served from cache only when the stack
    /// itself is cached as completed; a listing of an in-progress stack may
    /// still grow, so it is re-queried (and the stored copy replaced) on
    /// every call.
    pub async fn stack_resources(&self, stack_id: &str) -> Result<Vec<Resource>, PumpError> {
        let stack_completed = {
            let stacks = self.stacks.read().unwrap_or_else(|e| e.into_inner());
            stacks.contains_key(stack_id)
        };
        if stack_completed {
            let resources = self.resources.read().unwrap_or_else(|e| e.into_inner());
            if let Some(listing) = resources.get(stack_id) {
                return Ok(listing.clone());
            }
        }

        let listing = self.client.list_resources(stack_id, None, None).await?;
        {
            let mut resources = self.resources.write().unwrap_or_else(|e| e.into_inner());
            resources.insert(stack_id.to_string(), listing.clone());
        }
        Ok(listing)
    }
}
