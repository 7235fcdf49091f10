//! Artifact rendering
//!
//! Materializes the collected model as a re-runnable Ansible tree: per-role
//! task lists, deployment payloads, and a master playbook. A deployment file
//! that already exists on disk is never rewritten, so re-running against the
//! same output directory is safe.

pub mod ansible;
pub mod notify;

use tracing::info;

use crate::errors::PumpError;
use crate::filesys::dir::Dir;
use crate::models::deployment::Deployment;
use crate::models::server::{Server, ServerSet};
use crate::render::notify::SignalData;

/// Body of the per-role heat-config template
pub const HEAT_CONFIG_TEMPLATE: &str = "[{{ deployment | to_json }}]\n";

/// Render options
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Run the notify tool for each newly written deployment
    pub notify: bool,

    /// Notify command to run
    pub notify_command: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            notify: true,
            notify_command: notify::HEAT_CONFIG_NOTIFY.to_string(),
        }
    }
}

/// Directory name of a server's role
pub(crate) fn role_dir_name(server: &Server) -> String {
    format!("{}-{}", server.role(), server.id())
}

/// Path of a deployment artifact relative to the role's deployments
/// directory: the resolved resource path keeps records from different nested
/// stacks apart.
pub(crate) fn deployment_rel_path(deployment: &Deployment, suffix: &str) -> String {
    let name = format!("{}{}", deployment.id, suffix);
    match deployment.resource_path.as_deref() {
        Some(path) if !path.is_empty() => format!("{}/{}", path.join("/"), name),
        _ => name,
    }
}

/// Writes the artifact tree for a collected model
pub struct Renderer {
    output_dir: Dir,
    options: RenderOptions,
}

impl Renderer {
    pub fn new(output_dir: Dir, options: RenderOptions) -> Self {
        Self { output_dir, options }
    }

    /// Render roles and the master playbook for every known server.
    pub async fn render(
        &self,
        stack_name: &str,
        servers: &ServerSet,
        steps: u32,
    ) -> Result<(), PumpError> {
        let roles_dir = self.output_dir.subdir("roles");
        let playbooks_dir = self.output_dir.subdir("playbooks");
        roles_dir.create().await?;
        playbooks_dir.create().await?;

        for server in servers.iter() {
            self.render_role(&roles_dir, server).await?;
        }

        let playbook = ansible::playbook(stack_name, servers, steps);
        playbooks_dir
            .file(&format!("{}.yaml", stack_name))
            .write_string(&serde_yaml::to_string(&playbook)?)
            .await?;

        Ok(())
    }

    async fn render_role(&self, roles_dir: &Dir, server: &Server) -> Result<(), PumpError> {
        let role_dir = roles_dir.subdir(&role_dir_name(server));
        let deployments_dir = role_dir.subdir("deployments");
        deployments_dir.create().await?;

        self.render_deployments(&deployments_dir, server).await?;

        let tasks = ansible::role_tasks(server);
        role_dir
            .subdir("tasks")
            .file("main.yaml")
            .write_string(&serde_yaml::to_string(&tasks)?)
            .await?;

        role_dir
            .subdir("templates")
            .file("heat-config")
            .write_string(HEAT_CONFIG_TEMPLATE)
            .await?;

        Ok(())
    }

    /// Write deployment payloads in step order, skipping files that already
    /// exist. Each newly written deployment gets a notify companion and, when
    /// enabled, a notify-tool invocation.
    async fn render_deployments(
        &self,
        deployments_dir: &Dir,
        server: &Server,
    ) -> Result<(), PumpError> {
        let signal = SignalData::default();

        for step_deployments in server.deployments().values() {
            for deployment in step_deployments {
                let deployment_file =
                    deployments_dir.file(&deployment_rel_path(deployment, ".json"));
                if deployment_file.exists().await {
                    info!("deployment {} already written, skipping", deployment.id);
                    continue;
                }

                info!(
                    "writing new deployment {} for server {}",
                    deployment.id,
                    server.name()
                );
                deployment_file.write_json(deployment).await?;
                deployments_dir
                    .file(&deployment_rel_path(deployment, ".notify.json"))
                    .write_json(&signal)
                    .await?;

                if self.options.notify {
                    notify::notify_deployment(
                        &self.options.notify_command,
                        deployment_file.path(),
                        &signal,
                    )
                    .await?;
                }
            }
        }

        Ok(())
    }
}
