//! A transit network: the modes and candidate routes laid over a city graph.

use std::sync::Arc;

use tracing::debug;

use super::{NetworkError, Route, TransportMode};
use crate::city::Graph;

/// Modes and routes over one graph.
///
/// # Invariants
///
/// - Mode names are unique, as are route names
/// - Every route's mode is registered
/// - Every route runs over existing nodes and positive-length graph edges
#[derive(Debug, Clone)]
pub struct TransitNetwork {
    graph: Arc<Graph>,
    modes: Vec<Arc<TransportMode>>,
    routes: Vec<Route>,
}

impl TransitNetwork {
    pub fn new(graph: Arc<Graph>) -> Self {
        Self {
            graph,
            modes: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn modes(&self) -> &[Arc<TransportMode>] {
        &self.modes
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Look up a registered mode by name.
    pub fn mode(&self, name: &str) -> Option<&Arc<TransportMode>> {
        self.modes.iter().find(|m| m.name() == name)
    }

    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name() == name)
    }

    /// Register a mode, returning the shared handle routes should use.
    pub fn add_mode(&mut self, mode: TransportMode) -> Result<Arc<TransportMode>, NetworkError> {
        if self.mode(mode.name()).is_some() {
            return Err(NetworkError::DuplicateMode(mode.name().to_string()));
        }
        let mode = Arc::new(mode);
        self.modes.push(Arc::clone(&mode));
        Ok(mode)
    }

    /// Unregister a mode.
    ///
    /// Routes using the mode stay in the network, and are then rejected by
    /// [`TransitNetwork::validate`].
    pub fn remove_mode(&mut self, name: &str) -> Option<Arc<TransportMode>> {
        let idx = self.modes.iter().position(|m| m.name() == name)?;
        Some(self.modes.remove(idx))
    }

    /// Validate and add a route.
    pub fn add_route(&mut self, route: Route) -> Result<(), NetworkError> {
        if self.route(route.name()).is_some() {
            return Err(NetworkError::DuplicateRoute(route.name().to_string()));
        }
        self.check_route(&route)?;
        debug!(route = route.name(), mode = route.mode().name(), "route added");
        self.routes.push(route);
        Ok(())
    }

    /// Add every route, stopping at the first failure.
    pub fn add_routes(&mut self, routes: impl IntoIterator<Item = Route>) -> Result<(), NetworkError> {
        routes.into_iter().try_for_each(|route| self.add_route(route))
    }

    pub fn remove_route(&mut self, name: &str) -> Option<Route> {
        let idx = self.routes.iter().position(|r| r.name() == name)?;
        Some(self.routes.remove(idx))
    }

    /// Re-check every route against the current modes and graph.
    pub fn validate(&self) -> Result<(), NetworkError> {
        self.routes.iter().try_for_each(|route| self.check_route(route))
    }

    fn check_route(&self, route: &Route) -> Result<(), NetworkError> {
        let registered = self
            .mode(route.mode().name())
            .is_some_and(|m| **m == **route.mode());
        if !registered {
            return Err(NetworkError::UnknownMode {
                route: route.name().to_string(),
                mode: route.mode().name().to_string(),
            });
        }

        for node in route.nodes() {
            if self.graph.node(node).is_none() {
                return Err(NetworkError::UnknownNode {
                    route: route.name().to_string(),
                    node,
                });
            }
        }

        for (_, itinerary) in route.directions() {
            for (from, to) in itinerary.links() {
                let edge = self.graph.edge_between(from, to).ok_or_else(|| {
                    NetworkError::MissingEdge {
                        route: route.name().to_string(),
                        from,
                        to,
                    }
                })?;
                if edge.length <= 0.0 {
                    return Err(NetworkError::DegenerateEdge {
                        route: route.name().to_string(),
                        from,
                        to,
                    });
                }
            }
        }
        Ok(())
    }
}
