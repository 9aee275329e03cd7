//! Optimization output records.

use serde::Serialize;

use crate::city::NodeId;

/// Whether the frequency iteration settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceStatus {
    /// Frequencies changed by less than the tolerance in the last iteration
    Converged,
    /// The iteration cap was reached first; the last iterate is reported
    MaxIterationsReached,
}

/// Network-wide costs and average trip times.
///
/// Costs are per hour of operation. Times are hours per assigned trip and
/// transfers a count per assigned trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallResult {
    pub vrc: f64,
    pub operator_cost: f64,
    pub infrastructure_cost: f64,
    pub user_cost: f64,
    pub travel_time_on_board: f64,
    pub waiting_time: f64,
    pub access_time: f64,
    pub transfers: f64,
    pub assigned_trips: f64,
    /// Trips with no transit path, excluded from every aggregate
    pub unassigned_trips: f64,
    /// Trips starting and ending in the same zone, never assigned
    pub intrazonal_trips: f64,
}

/// Fleet summary of one transport mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeResult {
    pub mode: String,
    pub vehicles: f64,
    /// Largest load per vehicle among the mode's routes
    pub vehicle_capacity: f64,
    pub lines: f64,
    pub infrastructure_cost: f64,
}

/// Passengers assigned between two consecutive stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArcFlow {
    pub origin: NodeId,
    pub destination: NodeId,
    pub flow: f64,
}

/// Design and load of one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub route: String,
    pub mode: String,
    /// Vehicles per hour over all the route's lines
    pub frequency: f64,
    pub frequency_per_line: f64,
    pub fleet: f64,
    /// Peak load per vehicle. Not clipped to the mode's capacity.
    pub vehicle_capacity: f64,
    pub over_capacity: bool,
    /// Hours
    pub cycle_time: f64,
    pub operating_cost: f64,
    pub lambda_min: f64,
    pub lambda_max: f64,
    pub boardings: f64,
    pub outbound: Vec<ArcFlow>,
    pub inbound: Vec<ArcFlow>,
}

/// Everything a finished optimization reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimization {
    pub status: ConvergenceStatus,
    pub iterations: usize,
    /// Largest relative frequency change in the last iteration
    pub max_relative_change: f64,
    pub overall: OverallResult,
    pub modes: Vec<ModeResult>,
    pub routes: Vec<RouteResult>,
}

impl Optimization {
    pub fn converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }

    pub fn route(&self, name: &str) -> Option<&RouteResult> {
        self.routes.iter().find(|r| r.route == name)
    }

    pub fn mode(&self, name: &str) -> Option<&ModeResult> {
        self.modes.iter().find(|m| m.mode == name)
    }
}

/// Non-zero stop-to-stop flows of one direction.
pub(crate) fn arc_flows(stops: &[NodeId], loads: &[f64]) -> Vec<ArcFlow> {
    stops
        .windows(2)
        .zip(loads)
        .filter(|(_, load)| **load > 0.0)
        .map(|(pair, &flow)| ArcFlow {
            origin: pair[0],
            destination: pair[1],
            flow,
        })
        .collect()
}
