//! The assignment and frequency design iteration.
//!
//! Each iteration prices waiting at the current frequencies, loads the
//! demand onto the line graph, and designs a new frequency for every route
//! from its load. Frequencies move part of the way towards the designed
//! values until no route would change by more than the tolerance; a
//! converged run reports the designed frequencies of its last iteration.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::assignment::{Assignment, assign};
use super::config::OptimizerConfig;
use super::costs::{infrastructure_cost, operator_cost, user_cost};
use super::frequency::{RouteGeometry, RouteLoad, design_frequency, fleet};
use super::line_graph::LineGraph;
use super::results::{
    ConvergenceStatus, ModeResult, Optimization, OverallResult, RouteResult, arc_flows,
};
use crate::city::{DemandMatrix, Graph};
use crate::transit::{Direction, NetworkError, PassengerProfile, TransitNetwork, TransportMode};

/// Fixed frequencies (veh/h) by route name.
pub type TargetFrequencies = HashMap<String, f64>;

/// Error from an optimization run.
///
/// Every variant is detected before any assignment is computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    /// The graph has no CBD
    #[error("the graph has no center node")]
    MissingCenter,

    /// The demand matrix does not match the graph
    #[error("demand matrix is {demand}x{demand} but the graph has {nodes} nodes")]
    DemandSize { demand: usize, nodes: usize },

    /// The network was built over a different graph
    #[error("the transit network is laid over a different graph")]
    GraphMismatch,

    /// Invalid passenger, mode or route
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// A target frequency names a route the network does not have
    #[error("target frequency given for unknown route {0}")]
    UnknownRoute(String),

    /// A target frequency is not a positive number
    #[error("invalid target frequency {frequency} for route {route}")]
    InvalidFrequency { route: String, frequency: f64 },

    /// The configuration cannot drive an iteration
    #[error("invalid optimizer configuration: {0}")]
    InvalidConfig(String),
}

/// Assigns demand to a transit network and designs its frequencies.
pub struct Optimizer<'a> {
    graph: &'a Graph,
    demand: &'a DemandMatrix,
    passenger: &'a PassengerProfile,
    config: &'a OptimizerConfig,
}

impl<'a> Optimizer<'a> {
    /// Create a new optimizer.
    pub fn new(
        graph: &'a Graph,
        demand: &'a DemandMatrix,
        passenger: &'a PassengerProfile,
        config: &'a OptimizerConfig,
    ) -> Self {
        Self {
            graph,
            demand,
            passenger,
            config,
        }
    }

    /// Run the iteration to convergence or to the iteration cap.
    ///
    /// Routes named in `targets` run at the given frequency, bounded by their
    /// mode, instead of a designed one. Reaching the iteration cap is not an
    /// error: the result carries [`ConvergenceStatus::MaxIterationsReached`].
    pub fn run(
        &self,
        network: &TransitNetwork,
        targets: &TargetFrequencies,
    ) -> Result<Optimization, OptimizeError> {
        self.validate(network, targets)?;

        let routes = network.routes();
        let modes: Vec<&TransportMode> = routes.iter().map(|r| r.mode().as_ref()).collect();
        let fixed: Vec<Option<f64>> = routes.iter().map(|r| targets.get(r.name()).copied()).collect();

        let mut line_graph = LineGraph::new(self.graph, network, self.passenger);
        let geometry = RouteGeometry::of_routes(line_graph.lines(), &modes);

        let mut frequencies: Vec<f64> = modes
            .iter()
            .zip(&fixed)
            .map(|(mode, target)| {
                let params = mode.params();
                target.map_or(params.fini, |f| f.clamp(params.fini, params.fmax))
            })
            .collect();

        debug!(
            routes = routes.len(),
            lines = line_graph.lines().len(),
            nodes = line_graph.node_count(),
            trips = self.demand.total(),
            "Starting optimization"
        );

        let mut iterations = 0;
        let (assignment, loads, status, change) = loop {
            iterations += 1;
            line_graph.reprice(&frequencies);
            let assignment = assign(&line_graph, self.demand, self.config.dispersion_floor);
            let loads: Vec<RouteLoad> = geometry
                .iter()
                .map(|g| RouteLoad::new(g, &assignment))
                .collect();

            let designed: Vec<f64> = (0..routes.len())
                .map(|r| design_frequency(modes[r], self.passenger, &geometry[r], &loads[r], fixed[r]))
                .collect();
            let change = frequencies
                .iter()
                .zip(&designed)
                .map(|(f, target)| (target - f).abs() / f)
                .fold(0.0, f64::max);

            debug!(
                iteration = iterations,
                change,
                user_cost = user_cost(self.passenger, &assignment),
                "Assignment iteration"
            );

            if change <= self.config.tolerance {
                // Converged: report the designed frequencies
                frequencies = designed;
                break (assignment, loads, ConvergenceStatus::Converged, change);
            }
            if iterations >= self.config.max_iterations {
                warn!(
                    iterations,
                    change,
                    tolerance = self.config.tolerance,
                    "Frequencies did not converge"
                );
                break (assignment, loads, ConvergenceStatus::MaxIterationsReached, change);
            }

            for (f, target) in frequencies.iter_mut().zip(&designed) {
                *f += self.config.damping * (target - *f);
            }
        };

        let result = self.summarize(network, &line_graph, &geometry, &assignment, &loads, &frequencies);

        info!(
            status = ?status,
            iterations,
            vrc = result.0.vrc,
            unassigned = result.0.unassigned_trips,
            "Optimization finished"
        );

        let (overall, modes, routes) = result;
        Ok(Optimization {
            status,
            iterations,
            max_relative_change: change,
            overall,
            modes,
            routes,
        })
    }

    fn validate(&self, network: &TransitNetwork, targets: &TargetFrequencies) -> Result<(), OptimizeError> {
        self.config.validate().map_err(OptimizeError::InvalidConfig)?;
        self.passenger.validate()?;

        if self.graph.center().is_none() {
            return Err(OptimizeError::MissingCenter);
        }
        if self.demand.size() != self.graph.node_count() {
            return Err(OptimizeError::DemandSize {
                demand: self.demand.size(),
                nodes: self.graph.node_count(),
            });
        }

        let laid_over = network.graph();
        if laid_over.nodes() != self.graph.nodes() || laid_over.edges() != self.graph.edges() {
            return Err(OptimizeError::GraphMismatch);
        }
        network.validate()?;

        for (name, &frequency) in targets {
            if network.route(name).is_none() {
                return Err(OptimizeError::UnknownRoute(name.clone()));
            }
            if !frequency.is_finite() || frequency <= 0.0 {
                return Err(OptimizeError::InvalidFrequency {
                    route: name.clone(),
                    frequency,
                });
            }
        }
        Ok(())
    }

    fn summarize(
        &self,
        network: &TransitNetwork,
        line_graph: &LineGraph<'_>,
        geometry: &[RouteGeometry],
        assignment: &Assignment,
        loads: &[RouteLoad],
        frequencies: &[f64],
    ) -> (OverallResult, Vec<ModeResult>, Vec<RouteResult>) {
        let routes: Vec<RouteResult> = network
            .routes()
            .iter()
            .enumerate()
            .map(|(r, route)| {
                let mode = route.mode();
                let params = mode.params();
                let frequency = frequencies[r];
                let fleet = fleet(mode, &geometry[r], frequency);
                let vehicle_capacity = loads[r].peak / frequency;
                let over_capacity = vehicle_capacity > params.kmax;
                if over_capacity {
                    warn!(
                        route = route.name(),
                        load_per_vehicle = vehicle_capacity,
                        kmax = params.kmax,
                        "Route runs over capacity"
                    );
                }

                let mut outbound = Vec::new();
                let mut inbound = Vec::new();
                for &line_idx in &geometry[r].lines {
                    let line = &line_graph.lines()[line_idx];
                    let flows = arc_flows(&line.stops, &assignment.segment_loads[line_idx]);
                    match line.direction {
                        Direction::Outbound => outbound = flows,
                        Direction::Inbound => inbound = flows,
                    }
                }

                RouteResult {
                    route: route.name().to_string(),
                    mode: mode.name().to_string(),
                    frequency,
                    frequency_per_line: frequency / params.d,
                    fleet,
                    vehicle_capacity,
                    over_capacity,
                    cycle_time: geometry[r].cycle_hours,
                    operating_cost: operator_cost(mode, frequency, fleet, geometry[r].length_km),
                    lambda_min: loads[r].least,
                    lambda_max: loads[r].peak,
                    boardings: loads[r].boardings,
                    outbound,
                    inbound,
                }
            })
            .collect();

        let modes: Vec<ModeResult> = network
            .modes()
            .iter()
            .map(|mode| {
                let served: Vec<usize> = (0..routes.len())
                    .filter(|&r| routes[r].mode == mode.name())
                    .collect();
                let infrastructure = infrastructure_cost(
                    self.graph,
                    mode,
                    served.iter().map(|&r| (&network.routes()[r], frequencies[r])),
                );
                ModeResult {
                    mode: mode.name().to_string(),
                    vehicles: served.iter().map(|&r| routes[r].fleet).sum(),
                    vehicle_capacity: served
                        .iter()
                        .map(|&r| routes[r].vehicle_capacity)
                        .fold(0.0, f64::max),
                    lines: served.len() as f64 * mode.params().d,
                    infrastructure_cost: infrastructure,
                }
            })
            .collect();

        if assignment.unassigned_trips > 0.0 {
            warn!(
                trips = assignment.unassigned_trips,
                "Demand with no transit path left unassigned"
            );
        }

        let operator: f64 = routes.iter().map(|r| r.operating_cost).sum();
        let infrastructure: f64 = modes.iter().map(|m| m.infrastructure_cost).sum();
        let users = user_cost(self.passenger, assignment);
        let per_trip = |total: f64| {
            if assignment.assigned_trips > 0.0 {
                total / assignment.assigned_trips
            } else {
                0.0
            }
        };

        let overall = OverallResult {
            vrc: operator + infrastructure + users,
            operator_cost: operator,
            infrastructure_cost: infrastructure,
            user_cost: users,
            travel_time_on_board: per_trip(assignment.in_vehicle_hours),
            waiting_time: per_trip(assignment.waiting_hours),
            access_time: per_trip(assignment.access_hours),
            transfers: per_trip(assignment.transfers),
            assigned_trips: assignment.assigned_trips,
            unassigned_trips: assignment.unassigned_trips,
            intrazonal_trips: assignment.intrazonal_trips,
        };

        (overall, modes, routes)
    }
}

/// Run one optimization with default targets.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use transit_optimizer::city::{DemandMatrix, Graph, GraphParameters};
/// use transit_optimizer::optimizer::{OptimizerConfig, optimize};
/// use transit_optimizer::transit::{
///     ModeParameters, PassengerProfile, RouteShape, TransitNetwork, TransportMode, generators,
/// };
///
/// let graph = Arc::new(Graph::build_from_parameters(&GraphParameters::new(2, 10.0, 0.5, 0.0)).unwrap());
/// let mut rows = vec![vec![0.0; 5]; 5];
/// rows[1][0] = 100.0; // P_1 -> CBD
/// let demand = DemandMatrix::build_from_content(&graph, rows).unwrap();
///
/// let mut network = TransitNetwork::new(Arc::clone(&graph));
/// let bus = network.add_mode(TransportMode::new("bus", ModeParameters::bus()).unwrap()).unwrap();
/// let routes = generators::radial_routes(&network, &bus, RouteShape::default()).unwrap();
/// network.add_routes(routes).unwrap();
///
/// let result = optimize(
///     &graph,
///     &demand,
///     &PassengerProfile::default(),
///     &network,
///     None,
///     &OptimizerConfig::default(),
/// )
/// .unwrap();
///
/// assert!(result.converged());
/// assert!((result.overall.assigned_trips - 100.0).abs() < 1e-9);
/// let radial = result.route("R_bus_1").unwrap();
/// assert!(radial.boardings > 0.0);
/// assert!(radial.frequency >= ModeParameters::bus().fini);
/// ```
pub fn optimize(
    graph: &Graph,
    demand: &DemandMatrix,
    passenger: &PassengerProfile,
    network: &TransitNetwork,
    targets: Option<&TargetFrequencies>,
    config: &OptimizerConfig,
) -> Result<Optimization, OptimizeError> {
    let none = TargetFrequencies::new();
    Optimizer::new(graph, demand, passenger, config).run(network, targets.unwrap_or(&none))
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
