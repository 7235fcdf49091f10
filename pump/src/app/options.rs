//! Application configuration options

use std::path::PathBuf;

use crate::collect::collector::CollectOptions;
use crate::http::client::ClientOptions;
use crate::render::RenderOptions;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Orchestration API client configuration
    pub client: ClientOptions,

    /// Collection configuration
    pub collect: CollectOptions,

    /// Render configuration
    pub render: RenderOptions,

    /// Parent directory for generated output; each run writes a timestamped
    /// subdirectory
    pub output_directory: PathBuf,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            client: ClientOptions::default(),
            collect: CollectOptions::default(),
            render: RenderOptions::default(),
            output_directory: PathBuf::from("pump-output"),
        }
    }
}
