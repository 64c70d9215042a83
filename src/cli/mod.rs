//! CLI entry point
//!
//! Wires the configuration surface to the engine: observer construction,
//! optional step server launch, endpoint resolution (a discovered wire
//! descriptor wins over the flags), the feature loop, and the exit status.

mod launch;

pub use launch::StepServer;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use gherkin::{Feature, GherkinEnv};
use tracing::{debug, warn};

use crate::common::{Error, Result};
use crate::observers::ObserverSet;
use crate::runner::{RunControl, Runner};
use crate::wire::{descriptor, Endpoint, WireTarget};

#[derive(Parser)]
#[command(name = "cuke", about = "Runs Gherkin features against a wire protocol step server")]
#[command(version, long_about = None)]
pub struct Cli {
    /// Host the step server listens on
    #[arg(long, default_value = descriptor::DEFAULT_HOST)]
    pub host: String,

    /// Port the step server listens on
    #[arg(long, default_value_t = descriptor::DEFAULT_PORT)]
    pub port: u16,

    /// Comma-separated result observers: dots, junit, html
    #[arg(long, default_value = "dots")]
    pub output: String,

    /// Directory searched for a *.wire descriptor
    #[arg(long, default_value = "features/step_definitions")]
    pub wire_dir: PathBuf,

    /// Step server executable to launch before connecting
    #[arg(long)]
    pub server: Option<String>,

    /// Comma-separated arguments for the launched server
    #[arg(long)]
    pub server_args: Option<String>,

    /// Working directory for the launched server
    #[arg(long)]
    pub server_dir: Option<PathBuf>,

    /// Halt the whole run at the first failed scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Feature files or glob patterns; reads one feature from stdin
    /// when none are given
    pub features: Vec<String>,
}

/// Execute a whole run; returns whether every executed scenario passed
pub async fn run(cli: Cli) -> Result<bool> {
    let observers = ObserverSet::from_names(cli.output.split(','))?;

    let server = match cli.server.as_deref() {
        Some(path) => {
            let args = launch::split_args(cli.server_args.as_deref());
            Some(StepServer::launch(path, &args, cli.server_dir.as_deref()).await?)
        }
        None => None,
    };

    let target = resolve_target(&cli);
    let endpoint = Endpoint::connect(&target).await?;

    let mut runner = Runner::new(endpoint, observers, cli.fail_fast);
    runner.init()?;

    let sources = gather_features(&cli.features)?;

    let started = Instant::now();
    for source in &sources {
        let feature = match source.load() {
            Ok(feature) => feature,
            Err(error) => {
                // A broken feature input skips that input only.
                eprintln!("{error}");
                continue;
            }
        };
        if runner.run_feature(&feature).await == RunControl::Halt {
            break;
        }
    }
    if std::env::var_os("CUKE_PERF").is_some() {
        eprintln!("{}", started.elapsed().as_millis());
    }

    runner.shutdown()?;

    if let Some(server) = server {
        server.terminate().await;
    }

    Ok(runner.all_passed())
}

/// A discovered wire descriptor wins over the flags
fn resolve_target(cli: &Cli) -> WireTarget {
    if let Some(path) = descriptor::discover(&cli.wire_dir) {
        match WireTarget::load(&path) {
            Ok(target) => {
                debug!("using wire descriptor {}", path.display());
                return target;
            }
            Err(error) => warn!("{}; falling back to --host/--port", error),
        }
    }
    WireTarget::new(cli.host.clone(), cli.port)
}

/// One feature input for the run
#[derive(Debug)]
enum FeatureSource {
    Path(PathBuf),
    Stdin,
}

impl FeatureSource {
    fn load(&self) -> Result<Feature> {
        match self {
            Self::Path(path) => Feature::parse_path(path, GherkinEnv::default())
                .map_err(|error| Error::feature_parse(path.display().to_string(), error)),
            Self::Stdin => {
                let text = std::io::read_to_string(std::io::stdin())
                    .map_err(|error| Error::feature_parse("<stdin>", error))?;
                Feature::parse(&text, GherkinEnv::default())
                    .map_err(|error| Error::feature_parse("<stdin>", error))
            }
        }
    }
}

/// Expand the positional patterns, or fall back to stdin
fn gather_features(patterns: &[String]) -> Result<Vec<FeatureSource>> {
    if patterns.is_empty() {
        return Ok(vec![FeatureSource::Stdin]);
    }

    let mut sources = Vec::new();
    for pattern in patterns {
        println!("Running test: {pattern}");
        let paths = glob::glob(pattern).map_err(|error| Error::InvalidGlob {
            pattern: pattern.clone(),
            message: error.to_string(),
        })?;
        for path in paths.flatten() {
            sources.push(FeatureSource::Path(path));
        }
    }
    Ok(sources)
}
