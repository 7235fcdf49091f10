//! Main application run flow

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::collect::collector::Collector;
use crate::errors::PumpError;
use crate::filesys::dir::Dir;
use crate::http::client::HeatClient;
use crate::http::StackClient;
use crate::render::Renderer;
use crate::utils::run_timestamp;

/// Summary of one completed run
#[derive(Debug)]
pub struct RunSummary {
    pub servers: usize,
    pub steps: u32,
    pub output_dir: PathBuf,
}

/// Run stack-pump against the configured orchestration endpoint
pub async fn run(options: AppOptions) -> Result<RunSummary, PumpError> {
    let client = Arc::new(HeatClient::new(&options.client)?);
    run_with_client(client, options).await
}

/// Run with an injected client: collect until the stack converges, then
/// render the artifact tree once.
pub async fn run_with_client(
    client: Arc<dyn StackClient>,
    options: AppOptions,
) -> Result<RunSummary, PumpError> {
    let output_dir = Dir::new(
        options
            .output_directory
            .join(format!("pump-output-{}", run_timestamp())),
    );
    output_dir.create().await?;
    info!("output saved in {}", output_dir.path().display());

    let mut collector = Collector::new(client, options.collect.clone());
    collector.run().await?;
    collector.finalize().await?;

    info!(
        "stack {} is complete, rendering",
        options.collect.stack_name
    );

    let steps = collector.steps();
    let servers = collector.into_servers();
    let renderer = Renderer::new(output_dir.clone(), options.render.clone());
    renderer
        .render(&options.collect.stack_name, &servers, steps)
        .await?;

    Ok(RunSummary {
        servers: servers.len(),
        steps,
        output_dir: output_dir.path().to_path_buf(),
    })
}
