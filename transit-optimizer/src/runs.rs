//! Optimization runs: lifecycle records and per-network admission control.
//!
//! A run moves `Pending -> Running -> {Converged, MaxIterationsReached,
//! Failed}`. Only one run per transport network may be in flight; a second
//! request for the same network is rejected rather than queued.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::optimizer::{ConvergenceStatus, Optimization, OptimizerConfig, Optimizer};
use crate::scene::Scene;

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Converged,
    MaxIterationsReached,
    Failed,
}

impl RunStatus {
    /// Returns true once the run can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Converged | RunStatus::MaxIterationsReached | RunStatus::Failed
        )
    }

    /// Returns true for the terminal states that carry a result.
    pub fn has_result(self) -> bool {
        matches!(self, RunStatus::Converged | RunStatus::MaxIterationsReached)
    }
}

impl From<ConvergenceStatus> for RunStatus {
    fn from(status: ConvergenceStatus) -> Self {
        match status {
            ConvergenceStatus::Converged => RunStatus::Converged,
            ConvergenceStatus::MaxIterationsReached => RunStatus::MaxIterationsReached,
        }
    }
}

/// Errors from run bookkeeping. Optimization failures are not errors here:
/// they end the run in [`RunStatus::Failed`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunError {
    /// Another run for the same network has not finished
    #[error("network {0} already has a run in progress")]
    AlreadyRunning(String),

    /// The requested state change does not follow the lifecycle
    #[error("cannot move run of {network} from {from:?} to {to:?}")]
    InvalidTransition {
        network: String,
        from: RunStatus,
        to: RunStatus,
    },
}

/// Bookkeeping of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub network: String,
    pub status: RunStatus,
    /// When the run started
    pub ran_at: Option<DateTime<Utc>>,
    /// Wall-clock seconds from start to finish
    pub duration: Option<f64>,
    pub error_message: Option<String>,
}

impl RunRecord {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            status: RunStatus::Pending,
            ran_at: None,
            duration: None,
            error_message: None,
        }
    }

    /// Move from `Pending` to `Running` and record the start time.
    pub fn start(&mut self) -> Result<(), RunError> {
        self.transition(RunStatus::Running)?;
        self.ran_at = Some(Utc::now());
        Ok(())
    }

    /// Move from `Running` to a terminal state and record the duration.
    ///
    /// `error_message` is kept only for [`RunStatus::Failed`].
    pub fn finish(&mut self, status: RunStatus, error_message: Option<String>) -> Result<(), RunError> {
        if !status.is_terminal() {
            return Err(self.invalid(status));
        }
        self.transition(status)?;
        self.duration = self
            .ran_at
            .and_then(|start| (Utc::now() - start).num_microseconds())
            .map(|us| us as f64 / 1e6);
        self.error_message = if status == RunStatus::Failed {
            error_message
        } else {
            None
        };
        Ok(())
    }

    fn transition(&mut self, to: RunStatus) -> Result<(), RunError> {
        let allowed = match self.status {
            RunStatus::Pending => to == RunStatus::Running,
            RunStatus::Running => to.is_terminal(),
            _ => false,
        };
        if !allowed {
            return Err(self.invalid(to));
        }
        self.status = to;
        Ok(())
    }

    fn invalid(&self, to: RunStatus) -> RunError {
        RunError::InvalidTransition {
            network: self.network.clone(),
            from: self.status,
            to,
        }
    }
}

/// A finished run: its record and, unless it failed, its result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run: RunRecord,
    #[serde(flatten)]
    pub result: Option<Optimization>,
}

/// Networks with a run in flight.
///
/// Cloning shares the same set.
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the run slot of a network.
    ///
    /// The slot is released when the returned guard is dropped.
    pub fn try_begin(&self, network: &str) -> Result<RunGuard, RunError> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(network.to_string()) {
            return Err(RunError::AlreadyRunning(network.to_string()));
        }
        Ok(RunGuard {
            registry: self.clone(),
            network: network.to_string(),
        })
    }

    /// Returns true if a run for the network is in flight.
    pub fn is_running(&self, network: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(network)
    }
}

/// Holds a network's run slot.
#[derive(Debug)]
pub struct RunGuard {
    registry: RunRegistry,
    network: String,
}

impl RunGuard {
    pub fn network(&self) -> &str {
        &self.network
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.registry
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.network);
    }
}

/// Optimize a scene as one run of its network.
///
/// Input and domain errors from the optimizer end the run as
/// [`RunStatus::Failed`] with the error message; only admission control
/// is reported as an `Err`.
pub fn execute_run(
    registry: &RunRegistry,
    scene: &Scene,
    config: &OptimizerConfig,
) -> Result<RunReport, RunError> {
    let _guard = registry.try_begin(&scene.name)?;
    let mut run = RunRecord::new(&scene.name);
    run.start()?;

    let optimizer = Optimizer::new(&scene.graph, &scene.demand, &scene.passenger, config);
    match optimizer.run(&scene.network, &scene.targets) {
        Ok(result) => {
            run.finish(result.status.into(), None)?;
            info!(
                network = %scene.name,
                status = ?run.status,
                duration = run.duration,
                "Run finished"
            );
            Ok(RunReport {
                run,
                result: Some(result),
            })
        }
        Err(e) => {
            warn!(network = %scene.name, error = %e, "Run failed");
            run.finish(RunStatus::Failed, Some(e.to_string()))?;
            Ok(RunReport { run, result: None })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneDocument;

    fn scene(name: &str, routes: &str) -> Scene {
        let json = format!(
            r#"{{
                "name": "{name}",
                "city": {{ "source": "parameters", "n": 2, "l": 10.0, "g": 0.5, "p": 0.0 }},
                "demand": {{ "source": "parameters", "y": 500.0, "a": 0.5, "alpha": 0.5, "beta": 0.2 }},
                "modes": [
                    {{ "name": "bus", "bya": 1, "co": 8.61, "c1": 15.0, "c2": 0.5, "v": 20.0, "t": 10.0,
                       "fmax": 150.0, "kmax": 160.0, "theta": 0.5, "tat": 5.0, "d": 1.0, "fini": 2.0 }}
                ],
                "generate": [ {routes} ]
            }}"#
        );
        SceneDocument::parse(&json).unwrap().build().unwrap()
    }

    #[test]
    fn lifecycle_transitions() {
        let mut run = RunRecord::new("net");
        assert_eq!(run.status, RunStatus::Pending);
        assert!(run.ran_at.is_none());

        run.start().unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.ran_at.is_some());

        run.finish(RunStatus::Converged, Some("ignored".to_string()))
            .unwrap();
        assert_eq!(run.status, RunStatus::Converged);
        assert!(run.duration.unwrap() >= 0.0);
        assert_eq!(run.error_message, None);
    }

    #[test]
    fn rejects_out_of_order_transitions() {
        let mut run = RunRecord::new("net");
        assert!(run.finish(RunStatus::Failed, None).is_err());

        run.start().unwrap();
        assert!(run.start().is_err());
        assert_eq!(
            run.finish(RunStatus::Pending, None),
            Err(RunError::InvalidTransition {
                network: "net".to_string(),
                from: RunStatus::Running,
                to: RunStatus::Pending,
            })
        );

        run.finish(RunStatus::Failed, Some("boom".to_string())).unwrap();
        assert_eq!(run.error_message.as_deref(), Some("boom"));
        assert!(run.finish(RunStatus::Converged, None).is_err());
    }

    #[test]
    fn one_run_per_network() {
        let registry = RunRegistry::new();

        let guard = registry.try_begin("a").unwrap();
        assert_eq!(guard.network(), "a");
        assert!(registry.is_running("a"));
        assert_eq!(
            registry.try_begin("a").unwrap_err(),
            RunError::AlreadyRunning("a".to_string())
        );
        // Other networks are unaffected
        let other = registry.try_begin("b").unwrap();

        drop(guard);
        assert!(!registry.is_running("a"));
        assert!(registry.try_begin("a").is_ok());
        drop(other);
    }

    #[test]
    fn executes_scene() {
        let registry = RunRegistry::new();
        let scene = scene("radial", r#"{ "template": "radial", "mode": "bus" }"#);

        let report = execute_run(&registry, &scene, &OptimizerConfig::default()).unwrap();

        assert!(report.run.status.has_result());
        assert!(report.result.is_some());
        assert!(!registry.is_running("radial"));
    }

    #[test]
    fn optimizer_errors_fail_the_run() {
        let registry = RunRegistry::new();
        let mut scene = scene("bad", r#"{ "template": "feeder", "mode": "bus" }"#);
        scene.targets.insert("nope".to_string(), 3.0);

        let report = execute_run(&registry, &scene, &OptimizerConfig::default()).unwrap();

        assert_eq!(report.run.status, RunStatus::Failed);
        assert!(report.result.is_none());
        assert!(report.run.error_message.unwrap().contains("nope"));
    }

    #[test]
    fn busy_network_is_rejected() {
        let registry = RunRegistry::new();
        let scene = scene("busy", r#"{ "template": "radial", "mode": "bus" }"#);
        let _held = registry.try_begin("busy").unwrap();

        assert_eq!(
            execute_run(&registry, &scene, &OptimizerConfig::default()).unwrap_err(),
            RunError::AlreadyRunning("busy".to_string())
        );
    }

    #[test]
    fn report_flattens_result() {
        let registry = RunRegistry::new();
        let scene = scene("json", r#"{ "template": "radial", "mode": "bus" }"#);

        let report = execute_run(&registry, &scene, &OptimizerConfig::default()).unwrap();
        let value = serde_json::to_value(&report).unwrap();

        assert!(value["run"]["ran_at"].is_string());
        assert!(value["overall"]["vrc"].is_number());
        assert_eq!(value["routes"].as_array().unwrap().len(), 2);
    }
}
