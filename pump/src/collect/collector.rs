//! Poll loop driving deployment discovery

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::stack::StackCache;
use crate::collect::resolver::{PathResolver, RetryPolicy};
use crate::errors::PumpError;
use crate::http::StackClient;
use crate::models::deployment::Deployment;
use crate::models::server::{ServerSet, DEPLOYED_SERVER_TYPE};

/// Collection options
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Stack to watch
    pub stack_name: String,

    /// Resource types treated as servers
    pub server_resource_types: Vec<String>,

    /// Nesting depth for server discovery
    pub nested_depth: u32,

    /// Pause between polling iterations
    pub poll_interval: Duration,

    /// Run one discovery pass even when the stack is already complete
    pub force: bool,

    /// Retry policy for the resolver's existence poll
    pub retry: RetryPolicy,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            stack_name: "overcloud".to_string(),
            server_resource_types: vec![
                "OS::Nova::Server".to_string(),
                DEPLOYED_SERVER_TYPE.to_string(),
            ],
            nested_depth: 10,
            poll_interval: Duration::from_secs(30),
            force: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// Collection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// Discovery passes are still running
    Polling,

    /// The stack reached a completed status
    Converged,

    /// The stack reached a failed status
    Failed,
}

/// Polls the orchestration API and accumulates the server/deployment model
pub struct Collector {
    client: Arc<dyn StackClient>,
    cache: Arc<StackCache>,
    resolver: PathResolver,
    options: CollectOptions,
    servers: ServerSet,
    state: CollectorState,
    step: u32,
}

impl Collector {
    pub fn new(client: Arc<dyn StackClient>, options: CollectOptions) -> Self {
        let cache = Arc::new(StackCache::new(client.clone()));
        let resolver = PathResolver::new(cache.clone(), options.retry.clone());
        Self {
            client,
            cache,
            resolver,
            options,
            servers: ServerSet::new(),
            state: CollectorState::Polling,
            step: 0,
        }
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    /// Number of discovery passes run; also the final step count handed to
    /// the renderer.
    pub fn steps(&self) -> u32 {
        self.step
    }

    pub fn servers(&self) -> &ServerSet {
        &self.servers
    }

    pub fn into_servers(self) -> ServerSet {
        self.servers
    }

    /// Poll until the stack converges or fails.
    ///
    /// One discovery pass runs per iteration; the step index increments once
    /// per iteration, after the pass, so a pass started with index N records
    /// its deployments under step N. The iteration that observes a completed
    /// status exits without another pass, except that `force` runs exactly
    /// one pass on an already-complete stack and then converges regardless
    /// of any later status.
    pub async fn run(&mut self) -> Result<(), PumpError> {
        if self.options.force {
            info!("force enabled, collecting at least one pass");
        }
        info!(
            "polling stack {} for deployments",
            self.options.stack_name
        );
        let mut force = self.options.force;

        loop {
            let stack = self.cache.get_stack(&self.options.stack_name).await?;
            info!(
                "stack {} status: {}",
                self.options.stack_name, stack.stack_status
            );

            if stack.stack_status.is_failed() {
                self.state = CollectorState::Failed;
                return Err(PumpError::StackFailed {
                    stack: self.options.stack_name.clone(),
                    status: stack.stack_status,
                });
            }

            if stack.stack_status.is_complete() {
                if force {
                    self.discover(&stack.id).await?;
                    self.step += 1;
                }
                self.state = CollectorState::Converged;
                return Ok(());
            }

            self.discover(&stack.id).await?;
            self.step += 1;
            force = false;

            debug!("sleeping for {:?}", self.options.poll_interval);
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    /// One discovery pass: find server resources, then record every listed
    /// deployment at the current step. Re-observed deployment ids are
    /// dropped by the model, so a pass is safe to repeat.
    async fn discover(&mut self, stack_id: &str) -> Result<(), PumpError> {
        let step = self.step;
        debug!("discovery pass at step {}", step);

        let mut found = Vec::new();
        for resource_type in &self.options.server_resource_types {
            let mut resources = self
                .client
                .list_resources(
                    stack_id,
                    Some(resource_type.as_str()),
                    Some(self.options.nested_depth),
                )
                .await?;
            found.append(&mut resources);
        }

        for resource in found {
            let label = format!(
                "{} ({})",
                resource.resource_name, resource.physical_resource_id
            );
            if self.servers.register(resource) {
                info!("discovered server {}", label);
            }
        }

        for physical_id in self.servers.ids() {
            let (owning_stack, name) = match self.servers.get_mut(&physical_id) {
                Some(server) => (server.parent_stack_id()?, server.name().to_string()),
                None => continue,
            };

            let metadata = self.client.resource_metadata(&owning_stack, &name).await?;
            for mut deployment in metadata.deployments {
                let known = self
                    .servers
                    .get(&physical_id)
                    .is_none_or(|s| s.knows_deployment(&deployment.id));
                if known {
                    continue;
                }

                self.resolve_deployment_location(&mut deployment).await?;

                if let Some(server) = self.servers.get_mut(&physical_id) {
                    let deployment_id = deployment.id.clone();
                    if server.record_deployment(deployment, step) {
                        info!(
                            "recorded deployment {} for server {} at step {}",
                            deployment_id, name, step
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Resolve where a deployment lives in the nested stack tree: look up
    /// the deployment resource named by its inputs, then walk its path to
    /// the root. Computed once per deployment; the path is persisted on the
    /// record.
    pub async fn resolve_deployment_location(
        &self,
        deployment: &mut Deployment,
    ) -> Result<(), PumpError> {
        if deployment.resource_path.is_some() {
            return Ok(());
        }

        let deploy_stack_id = deployment.deploy_stack_id()?.to_string();
        let resource_name = deployment.deploy_resource_name()?.to_string();

        let listing = self.cache.stack_resources(&deploy_stack_id).await?;
        let resource = listing
            .iter()
            .find(|r| r.resource_name == resource_name)
            .ok_or_else(|| {
                PumpError::DeploymentError(
                    deployment.id.clone(),
                    format!(
                        "resource {} not found in stack {}",
                        resource_name, deploy_stack_id
                    ),
                )
            })?;

        let resolved = self
            .resolver
            .resolve(&deploy_stack_id, &resource.physical_resource_id)
            .await?;
        debug!(
            "deployment {} resolved to path {:?}",
            deployment.id, resolved
        );
        deployment.resource_path = Some(resolved);
        Ok(())
    }

    /// Resolve per-server display names. Run once after the loop has
    /// terminated, when every server's attributes are available.
    pub async fn finalize(&mut self) -> Result<(), PumpError> {
        for physical_id in self.servers.ids() {
            if let Some(server) = self.servers.get_mut(&physical_id) {
                server.resolve_display_name(self.client.as_ref()).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stack::StackStatus;
    use crate::testing::FakeClient;

    const STACK_ID: &str = "11111111-aaaa";
    const DEPLOY_STACK_ID: &str = "22222222-bbbb";

    fn options() -> CollectOptions {
        CollectOptions {
            stack_name: "overcloud".to_string(),
            server_resource_types: vec!["OS::Nova::Server".to_string()],
            nested_depth: 5,
            poll_interval: Duration::ZERO,
            force: false,
            retry: RetryPolicy {
                max_attempts: Some(5),
                delay: Duration::ZERO,
            },
        }
    }

    /// overcloud (STACK_ID) holding one server and one nested deploy stack
    fn fixture(statuses: &[StackStatus]) -> Arc<FakeClient> {
        let fake = Arc::new(FakeClient::new());
        fake.add_stack_entry("overcloud", STACK_ID, None, statuses);
        fake.add_stack_entry(STACK_ID, STACK_ID, None, statuses);
        fake.add_stack(DEPLOY_STACK_ID, Some(STACK_ID), &[StackStatus::CreateInProgress]);

        fake.add_resource(STACK_ID, FakeClient::resource("Controller", "server-1", STACK_ID));
        fake.add_resource(
            STACK_ID,
            FakeClient::typed_resource(
                "ControllerDeployGroup",
                DEPLOY_STACK_ID,
                STACK_ID,
                "OS::Heat::ResourceGroup",
            ),
        );
        fake.add_resource(
            DEPLOY_STACK_ID,
            FakeClient::typed_resource(
                "ControllerDeployment",
                "dep-phys-1",
                DEPLOY_STACK_ID,
                "OS::Heat::SoftwareDeployment",
            ),
        );
        fake
    }

    fn nested_deployment(id: &str, creation_time: &str) -> crate::models::deployment::Deployment {
        FakeClient::nested_deployment(
            id,
            creation_time,
            &format!("overcloud-deploy/{}", DEPLOY_STACK_ID),
            "ControllerDeployment",
        )
    }

    #[tokio::test]
    async fn test_two_passes_then_converged() {
        let fake = fixture(&[
            StackStatus::CreateInProgress,
            StackStatus::CreateInProgress,
            StackStatus::CreateComplete,
        ]);

        let mut collector = Collector::new(fake.clone(), options());
        collector.run().await.unwrap();

        assert_eq!(collector.state(), CollectorState::Converged);
        assert_eq!(collector.steps(), 2);
        // one listing per pass for the single configured type
        assert_eq!(fake.list_calls(STACK_ID), 2);
        // three status checks, none cached while in progress
        assert_eq!(fake.get_stack_calls("overcloud"), 3);
    }

    #[tokio::test]
    async fn test_deployment_recorded_once_at_first_step() {
        let fake = fixture(&[
            StackStatus::CreateInProgress,
            StackStatus::CreateInProgress,
            StackStatus::CreateComplete,
        ]);
        // same record observed on both passes
        fake.set_metadata(
            STACK_ID,
            "Controller",
            vec![nested_deployment("dep-1", "2026-01-01T00:00:00")],
        );

        let mut collector = Collector::new(fake.clone(), options());
        collector.run().await.unwrap();

        let server = collector.servers().get("server-1").unwrap();
        assert_eq!(server.deployments().len(), 1);
        let step0 = &server.deployments()[&0];
        assert_eq!(step0.len(), 1);
        assert_eq!(step0[0].id, "dep-1");
        assert_eq!(
            step0[0].resource_path.as_deref(),
            Some(&["ControllerDeployGroup".to_string(), "ControllerDeployment".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_force_runs_single_pass_on_complete_stack() {
        let fake = fixture(&[StackStatus::CreateComplete]);
        fake.set_metadata(
            STACK_ID,
            "Controller",
            vec![nested_deployment("dep-1", "2026-01-01T00:00:00")],
        );

        let mut opts = options();
        opts.force = true;
        let mut collector = Collector::new(fake.clone(), opts);
        collector.run().await.unwrap();

        assert_eq!(collector.state(), CollectorState::Converged);
        assert_eq!(collector.steps(), 1);
        // a single status check before the forced pass
        assert_eq!(fake.get_stack_calls("overcloud"), 1);
        let server = collector.servers().get("server-1").unwrap();
        assert_eq!(server.deployments()[&0].len(), 1);
    }

    #[tokio::test]
    async fn test_failed_stack_aborts_before_discovery() {
        let fake = fixture(&[StackStatus::CreateFailed]);

        let mut collector = Collector::new(fake.clone(), options());
        let err = collector.run().await.unwrap_err();

        assert!(matches!(err, PumpError::StackFailed { .. }));
        assert_eq!(collector.state(), CollectorState::Failed);
        assert_eq!(fake.list_calls(STACK_ID), 0);
    }

    #[tokio::test]
    async fn test_step_ordering_across_polls() {
        let fake = fixture(&[
            StackStatus::CreateInProgress,
            StackStatus::CreateInProgress,
            StackStatus::CreateComplete,
        ]);
        fake.set_metadata(
            STACK_ID,
            "Controller",
            vec![nested_deployment("dep-1", "2026-01-01T00:00:10")],
        );

        let mut collector = Collector::new(fake.clone(), options());
        // drive the iterations by hand to change metadata between passes
        let stack = collector.cache.get_stack("overcloud").await.unwrap();
        collector.discover(&stack.id).await.unwrap();
        collector.step += 1;

        // second poll returns the old record plus two new ones, out of order
        fake.set_metadata(
            STACK_ID,
            "Controller",
            vec![
                nested_deployment("dep-1", "2026-01-01T00:00:10"),
                nested_deployment("dep-3", "2026-01-01T00:01:00"),
                nested_deployment("dep-2", "2026-01-01T00:00:30"),
            ],
        );
        collector.discover(&stack.id).await.unwrap();
        collector.step += 1;

        let server = collector.servers().get("server-1").unwrap();
        let step0: Vec<&str> = server.deployments()[&0].iter().map(|d| d.id.as_str()).collect();
        let step1: Vec<&str> = server.deployments()[&1].iter().map(|d| d.id.as_str()).collect();
        assert_eq!(step0, vec!["dep-1"]);
        // within the step, creation-timestamp order wins over API order
        assert_eq!(step1, vec!["dep-2", "dep-3"]);
    }

    #[tokio::test]
    async fn test_finalize_resolves_display_names() {
        let fake = fixture(&[StackStatus::CreateComplete]);
        fake.set_attributes(
            STACK_ID,
            "Controller",
            serde_json::json!({"name": "overcloud-controller-0"}),
        );

        let mut opts = options();
        opts.force = true;
        let mut collector = Collector::new(fake.clone(), opts);
        collector.run().await.unwrap();
        collector.finalize().await.unwrap();

        let server = collector.servers().get("server-1").unwrap();
        assert_eq!(server.display_name(), "overcloud-controller-0");
    }
}
