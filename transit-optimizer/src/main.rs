use std::path::{Path, PathBuf};
use std::process::ExitCode;

use futures::future::join_all;
use tracing::error;
use tracing_subscriber::EnvFilter;

use transit_optimizer::optimizer::OptimizerConfig;
use transit_optimizer::runs::{RunError, RunRegistry, RunReport, execute_run};
use transit_optimizer::scene::{self, SceneError};

#[derive(Debug, thiserror::Error)]
enum BatchError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Run(#[from] RunError),
}

fn run_scene(path: &Path, registry: &RunRegistry, config: &OptimizerConfig) -> Result<RunReport, BatchError> {
    let scene = scene::load(path)?;
    Ok(execute_run(registry, &scene, config)?)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("usage: transit-optimizer <scene.json>...");
        return ExitCode::from(2);
    }

    let config = OptimizerConfig::from_env();
    let registry = RunRegistry::new();

    // Scenes are independent; each runs on its own blocking thread
    let tasks = paths.iter().cloned().map(|path| {
        let config = config.clone();
        let registry = registry.clone();
        tokio::task::spawn_blocking(move || run_scene(&path, &registry, &config))
    });
    let outcomes = join_all(tasks).await;

    let mut failed = false;
    for (path, outcome) in paths.iter().zip(outcomes) {
        let report = match outcome {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                error!(scene = %path.display(), error = %e, "Scene not run");
                failed = true;
                continue;
            }
            Err(e) => {
                error!(scene = %path.display(), error = %e, "Scene task panicked");
                failed = true;
                continue;
            }
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!(scene = %path.display(), error = %e, "Failed to serialize result");
                failed = true;
            }
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
