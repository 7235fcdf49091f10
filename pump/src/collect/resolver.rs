//! Resource path resolution
//!
//! Maps a (stack, physical resource id) pair to the ordered sequence of
//! resource names from the top-level stack down to the resource. The path is
//! the collision-free on-disk key for a deployment.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::stack::StackCache;
use crate::errors::PumpError;
use crate::models::stack::Resource;

/// Retry policy for the resource-existence poll.
///
/// A resource can be momentarily absent from a freshly listed nested stack
/// while the orchestration engine propagates state. The default polls
/// without bound and without delay; tests bound the attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Give up after this many listing attempts; `None` polls until found
    pub max_attempts: Option<u32>,

    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            delay: Duration::ZERO,
        }
    }
}

/// Resolves resource paths by walking nested stacks upward to the root
pub struct PathResolver {
    cache: Arc<StackCache>,
    retry: RetryPolicy,
}

impl PathResolver {
    pub fn new(cache: Arc<StackCache>, retry: RetryPolicy) -> Self {
        Self { cache, retry }
    }

    /// Ordered resource names from the outermost stack down to the resource
    /// with the given physical id, with a trailing group-index segment
    /// collapsed.
    ///
    /// Each level up, the nested stack itself is the resource to locate in
    /// its parent's listing. A failed stack anywhere on the walk is fatal.
    pub async fn resolve(
        &self,
        stack_id: &str,
        physical_resource_id: &str,
    ) -> Result<Vec<String>, PumpError> {
        let mut path = Vec::new();
        let mut stack_id = stack_id.to_string();
        let mut target = physical_resource_id.to_string();

        loop {
            let stack = self.cache.get_stack(&stack_id).await?;
            if stack.stack_status.is_failed() {
                return Err(PumpError::StackFailed {
                    stack: stack_id,
                    status: stack.stack_status,
                });
            }

            let resource = self.await_resource(&stack_id, &target).await?;
            path.push(resource.resource_name);

            match stack.parent {
                Some(parent) => {
                    target = stack_id;
                    stack_id = parent;
                }
                None => break,
            }
        }

        path.reverse();
        simplify_path(&mut path);
        Ok(path)
    }

    /// Find the resource with the given physical id in a stack's listing,
    /// polling until it becomes visible.
    async fn await_resource(
        &self,
        stack_id: &str,
        physical_id: &str,
    ) -> Result<Resource, PumpError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let listing = self.cache.stack_resources(stack_id).await?;
            if let Some(resource) = listing
                .into_iter()
                .find(|r| r.physical_resource_id == physical_id)
            {
                return Ok(resource);
            }

            if let Some(max) = self.retry.max_attempts {
                if attempts >= max {
                    return Err(PumpError::ResourceNotFound {
                        stack: stack_id.to_string(),
                        physical_id: physical_id.to_string(),
                        attempts,
                    });
                }
            }

            debug!(
                "resource {} not yet visible in stack {} (attempt {}), retrying",
                physical_id, stack_id, attempts
            );
            if !self.retry.delay.is_zero() {
                tokio::time::sleep(self.retry.delay).await;
            }
        }
    }
}

/// Drop a trailing all-digit segment: an indexed member of a resource group
/// collapses to the group directory.
pub fn simplify_path(path: &mut Vec<String>) {
    let indexed = path
        .last()
        .is_some_and(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));
    if indexed {
        path.pop();
    }
}
