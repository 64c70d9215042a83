//! Step server launching
//!
//! `--server` starts the step-definition server as a child process before
//! the endpoint connects. The child is terminated explicitly at the end of
//! the run and additionally marked kill-on-drop, so an aborted run does
//! not leave it behind.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::common::{Error, Result};

/// How long a freshly launched server gets to open its listener
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// A launched step server process
#[derive(Debug)]
pub struct StepServer {
    child: Child,
}

impl StepServer {
    /// Spawn the server and give it a moment to start listening
    pub async fn launch(path: &str, args: &[String], dir: Option<&Path>) -> Result<Self> {
        let mut command = Command::new(path);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);
        if let Some(dir) = dir {
            command.current_dir(dir);
        }

        info!("launching step server: {}", path);
        let child = command.spawn().map_err(|source| Error::ServerLaunch {
            path: path.to_string(),
            source,
        })?;

        tokio::time::sleep(SETTLE_DELAY).await;
        Ok(Self { child })
    }

    /// Stop the server at the end of the run
    pub async fn terminate(mut self) {
        debug!("terminating launched step server");
        if let Err(error) = self.child.kill().await {
            debug!("step server kill: {}", error);
        }
    }
}

/// Split a comma-separated `--server-args` value
pub fn split_args(args: Option<&str>) -> Vec<String> {
    match args {
        Some(args) if !args.is_empty() => args.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    }
}
