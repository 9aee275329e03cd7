//! Passenger assignment and frequency design.
//!
//! The optimizer alternates between loading demand onto the transit
//! network at the current frequencies and redesigning each route's
//! frequency from its load, then reports fleet, cost and load figures
//! for the settled design.

mod assignment;
mod config;
mod costs;
mod engine;
mod frequency;
mod line_graph;
mod results;

pub use config::OptimizerConfig;
pub use engine::{OptimizeError, Optimizer, TargetFrequencies, optimize};
pub use results::{
    ArcFlow, ConvergenceStatus, ModeResult, Optimization, OverallResult, RouteResult,
};
