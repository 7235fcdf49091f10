//! Ansible document types

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::server::{Server, ServerSet};
use crate::render::{deployment_rel_path, role_dir_name};

/// `include_vars` step loading a deployment record
#[derive(Debug, Serialize)]
pub struct IncludeVars {
    pub file: String,
    pub name: String,
}

/// `template` step rendering the heat-config payload
#[derive(Debug, Serialize)]
pub struct TemplateStep {
    pub src: String,
    pub dest: String,
}

/// One task in a role's tasks/main.yaml
#[derive(Debug, Serialize)]
pub struct Task {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_vars: Option<IncludeVars>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateStep>,
}

/// One play in the master playbook
#[derive(Debug, Serialize)]
pub struct Play {
    pub name: String,
    pub hosts: String,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, serde_yaml::Value>,

    pub roles: Vec<String>,
}

/// Tasks applying a server's deployments, steps in order, deployments in
/// creation-timestamp order within each step.
pub fn role_tasks(server: &Server) -> Vec<Task> {
    let mut tasks = Vec::new();
    for (step, deployments) in server.deployments() {
        for deployment in deployments {
            tasks.push(Task {
                name: format!("Load deployment {} (step {})", deployment.id, step),
                include_vars: Some(IncludeVars {
                    file: format!(
                        "deployments/{}",
                        deployment_rel_path(deployment, ".json")
                    ),
                    name: "deployment".to_string(),
                }),
                template: None,
            });
            tasks.push(Task {
                name: format!("Apply deployment {} (step {})", deployment.id, step),
                include_vars: None,
                template: Some(TemplateStep {
                    src: "heat-config".to_string(),
                    dest: format!("/var/run/heat-config/{}.json", deployment.id),
                }),
            });
        }
    }
    tasks
}

/// The master playbook: one play per server, carrying the final step count.
pub fn playbook(stack_name: &str, servers: &ServerSet, steps: u32) -> Vec<Play> {
    servers
        .iter()
        .map(|server| {
            let mut vars = BTreeMap::new();
            vars.insert(
                "deploy_steps".to_string(),
                serde_yaml::Value::from(u64::from(steps)),
            );
            Play {
                name: format!("Deployments for {} ({})", server.display_name(), stack_name),
                hosts: server.display_name().to_string(),
                vars,
                roles: vec![role_dir_name(server)],
            }
        })
        .collect()
}
