//! Deployment signaling
//!
//! Each newly written deployment is handed to the notify tool so the
//! orchestration engine sees the deployment as applied.

use std::path::Path;
use std::process::Stdio;

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::PumpError;

/// Default notify command
pub const HEAT_CONFIG_NOTIFY: &str = "heat-config-notify";

/// Signal payload for a freshly written deployment
#[derive(Debug, Clone, Serialize)]
pub struct SignalData {
    pub deploy_stdout: String,
    pub deploy_stderr: String,
    pub deploy_status_code: i32,
}

impl Default for SignalData {
    fn default() -> Self {
        Self {
            deploy_stdout: String::new(),
            deploy_stderr: String::new(),
            deploy_status_code: 0,
        }
    }
}

/// Run the notify tool for one deployment file, piping the signal JSON to
/// stdin. A non-zero exit is logged, not fatal.
pub async fn notify_deployment(
    command: &str,
    deployment_file: &Path,
    signal: &SignalData,
) -> Result<(), PumpError> {
    let payload = serde_json::to_string(signal)?;
    debug!("running: {} {}", command, deployment_file.display());

    let mut child = Command::new(command)
        .arg(deployment_file)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| PumpError::NotifyError(format!("failed to run {}: {}", command, e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(payload.as_bytes()).await?;
    }

    let output = child.wait_with_output().await?;
    debug!("stdout: {}", String::from_utf8_lossy(&output.stdout));
    debug!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    if !output.status.success() {
        warn!("{} exited with {}", command, output.status);
    }

    Ok(())
}
