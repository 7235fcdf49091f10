//! Renderer integration tests

use stack_pump::filesys::dir::Dir;
use stack_pump::models::deployment::Deployment;
use stack_pump::models::server::ServerSet;
use stack_pump::models::stack::{Link, Resource};
use stack_pump::render::{RenderOptions, Renderer};

fn server_resource(name: &str, physical_id: &str) -> Resource {
    Resource {
        resource_name: name.to_string(),
        physical_resource_id: physical_id.to_string(),
        resource_type: "OS::Nova::Server".to_string(),
        parent_resource: None,
        links: vec![Link {
            rel: "stack".to_string(),
            href: "http://heat.test/v1/tenant/stacks/overcloud/stack-1".to_string(),
        }],
    }
}

fn deployment(id: &str, creation_time: &str, resource_path: &[&str]) -> Deployment {
    let mut dep: Deployment = serde_json::from_value(serde_json::json!({
        "id": id,
        "creation_time": creation_time,
        "group": "script",
    }))
    .unwrap();
    dep.resource_path = Some(resource_path.iter().map(|s| s.to_string()).collect());
    dep
}

fn sample_servers() -> ServerSet {
    let mut servers = ServerSet::new();
    servers.register(server_resource("Controller", "server-1"));
    let server = servers.get_mut("server-1").unwrap();
    server.record_deployment(
        deployment(
            "dep-1",
            "2026-01-01T00:00:00",
            &["ControllerDeployGroup", "ControllerDeployment"],
        ),
        0,
    );
    server.record_deployment(
        deployment(
            "dep-2",
            "2026-01-01T00:10:00",
            &["ControllerDeployGroup", "ControllerPostDeployment"],
        ),
        1,
    );
    servers
}

fn no_notify() -> RenderOptions {
    RenderOptions {
        notify: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_render_writes_artifact_tree() {
    let output = Dir::create_temp_dir("pump-render-test").await.unwrap();
    let servers = sample_servers();

    let renderer = Renderer::new(output.clone(), no_notify());
    renderer.render("overcloud", &servers, 2).await.unwrap();

    let role_dir = output.subdir("roles").subdir("Controller-server-1");

    let dep_file = role_dir
        .subdir("deployments")
        .subdir("ControllerDeployGroup")
        .subdir("ControllerDeployment")
        .file("dep-1.json");
    assert!(dep_file.exists().await);
    let payload: serde_json::Value =
        serde_json::from_str(&dep_file.read_string().await.unwrap()).unwrap();
    assert_eq!(payload["id"], "dep-1");
    assert_eq!(payload["group"], "script");

    let notify_file = role_dir
        .subdir("deployments")
        .subdir("ControllerDeployGroup")
        .subdir("ControllerDeployment")
        .file("dep-1.notify.json");
    assert!(notify_file.exists().await);
    let signal: serde_json::Value =
        serde_json::from_str(&notify_file.read_string().await.unwrap()).unwrap();
    assert_eq!(signal["deploy_status_code"], 0);

    let tasks = role_dir
        .subdir("tasks")
        .file("main.yaml")
        .read_string()
        .await
        .unwrap();
    assert!(tasks.contains("dep-1"));
    assert!(tasks.contains("dep-2"));
    // step 0 tasks come before step 1 tasks
    assert!(tasks.find("dep-1").unwrap() < tasks.find("dep-2").unwrap());

    let template = role_dir
        .subdir("templates")
        .file("heat-config")
        .read_string()
        .await
        .unwrap();
    assert_eq!(template, "[{{ deployment | to_json }}]\n");

    let playbook = output
        .subdir("playbooks")
        .file("overcloud.yaml")
        .read_string()
        .await
        .unwrap();
    assert!(playbook.contains("hosts: Controller"));
    assert!(playbook.contains("Controller-server-1"));
    assert!(playbook.contains("deploy_steps: 2"));
}

#[tokio::test]
async fn test_render_never_rewrites_deployments() {
    let output = Dir::create_temp_dir("pump-render-test").await.unwrap();
    let servers = sample_servers();
    let renderer = Renderer::new(output.clone(), no_notify());

    renderer.render("overcloud", &servers, 2).await.unwrap();

    let dep_file = output
        .subdir("roles")
        .subdir("Controller-server-1")
        .subdir("deployments")
        .subdir("ControllerDeployGroup")
        .subdir("ControllerDeployment")
        .file("dep-1.json");
    dep_file.write_string("{\"marker\": true}").await.unwrap();

    renderer.render("overcloud", &servers, 2).await.unwrap();

    assert_eq!(
        dep_file.read_string().await.unwrap(),
        "{\"marker\": true}"
    );
}

#[tokio::test]
async fn test_render_flat_path_for_unresolved_deployment() {
    let output = Dir::create_temp_dir("pump-render-test").await.unwrap();
    let mut servers = ServerSet::new();
    servers.register(server_resource("Compute", "server-2"));
    let server = servers.get_mut("server-2").unwrap();
    let mut dep = deployment("dep-9", "2026-01-01T00:00:00", &[]);
    dep.resource_path = None;
    server.record_deployment(dep, 0);

    let renderer = Renderer::new(output.clone(), no_notify());
    renderer.render("overcloud", &servers, 1).await.unwrap();

    assert!(output
        .subdir("roles")
        .subdir("Compute-server-2")
        .subdir("deployments")
        .file("dep-9.json")
        .exists()
        .await);
}
