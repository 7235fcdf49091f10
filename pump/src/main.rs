//! stack-pump entry point
//!
//! Polls an orchestration stack while it is being created and generates
//! Ansible playbooks for the deployments attached to its servers.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use stack_pump::app::options::AppOptions;
use stack_pump::app::run::run;
use stack_pump::collect::collector::CollectOptions;
use stack_pump::http::client::ClientOptions;
use stack_pump::logs::{init_logging, LogLevel, LogOptions};
use stack_pump::render::RenderOptions;

/// Generate Ansible playbooks from a creating orchestration stack
#[derive(Parser, Debug)]
#[command(name = "stack-pump", version)]
struct Cli {
    /// Stack name to watch
    #[arg(short = 's', long, default_value = "overcloud")]
    stack_name: String,

    /// Nested depth to recurse the stack for resources
    #[arg(short = 'n', long, default_value_t = 10)]
    nested_depth: u32,

    /// Server resource type to query for associated deployments (repeatable)
    #[arg(long = "server-resource-type", value_name = "TYPE")]
    server_resource_types: Vec<String>,

    /// Parent output directory; artifacts land in a timestamped subdirectory
    #[arg(short = 'o', long, default_value = "pump-output")]
    output_directory: PathBuf,

    /// Sleep time in seconds between checks for stack completion
    #[arg(long, default_value_t = 30)]
    sleep_time: u64,

    /// Generate all deployments even if the stack is already complete
    #[arg(short, long)]
    force: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Orchestration API endpoint; falls back to $HEAT_ENDPOINT
    #[arg(long)]
    heat_endpoint: Option<String>,

    /// Auth token; falls back to $OS_AUTH_TOKEN
    #[arg(long)]
    os_token: Option<String>,

    /// Skip running heat-config-notify for new deployments
    #[arg(long)]
    no_notify: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    if let Err(e) = init_logging(LogOptions { log_level }) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let endpoint = cli
        .heat_endpoint
        .or_else(|| std::env::var("HEAT_ENDPOINT").ok())
        .unwrap_or_default();
    let token = cli.os_token.or_else(|| std::env::var("OS_AUTH_TOKEN").ok());

    let default_collect = CollectOptions::default();
    let options = AppOptions {
        client: ClientOptions {
            endpoint,
            token,
            ..Default::default()
        },
        collect: CollectOptions {
            stack_name: cli.stack_name,
            server_resource_types: if cli.server_resource_types.is_empty() {
                default_collect.server_resource_types
            } else {
                cli.server_resource_types
            },
            nested_depth: cli.nested_depth,
            poll_interval: Duration::from_secs(cli.sleep_time),
            force: cli.force,
            retry: default_collect.retry,
        },
        render: RenderOptions {
            notify: !cli.no_notify,
            ..Default::default()
        },
        output_directory: cli.output_directory,
    };

    match run(options).await {
        Ok(summary) => {
            info!(
                "done: {} servers over {} steps, output in {}",
                summary.servers,
                summary.steps,
                summary.output_dir.display()
            );
        }
        Err(e) => {
            error!("stack-pump failed: {e}");
            std::process::exit(1);
        }
    }
}
