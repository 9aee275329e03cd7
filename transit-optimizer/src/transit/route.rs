//! Routes: a mode running over node and stop sequences in one or two directions.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{NetworkError, TransportMode};
use crate::city::NodeId;

/// How a route was designed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    Custom,
    Predefined,
    Circular,
}

impl RouteType {
    /// Storage code: 1 custom, 2 predefined, 3 circular.
    pub fn code(self) -> u8 {
        match self {
            RouteType::Custom => 1,
            RouteType::Predefined => 2,
            RouteType::Circular => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RouteType::Custom),
            2 => Some(RouteType::Predefined),
            3 => Some(RouteType::Circular),
            _ => None,
        }
    }
}

/// Direction of travel along a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outbound,
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => write!(f, "outbound"),
            Direction::Inbound => write!(f, "inbound"),
        }
    }
}

/// The path of one route direction and where it stops.
///
/// # Invariants
///
/// - At least two nodes, with no node repeated back to back
/// - At least two stops
/// - Stops are a subsequence of nodes; `stop_positions` records where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    nodes: Vec<NodeId>,
    stops: Vec<NodeId>,
    stop_positions: Vec<usize>,
}

impl Itinerary {
    /// Build an itinerary, matching stops against the node path in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_optimizer::city::NodeId;
    /// use transit_optimizer::transit::Itinerary;
    ///
    /// let path = vec![NodeId(1), NodeId(2), NodeId(0)];
    /// let itinerary = Itinerary::new(path.clone(), vec![NodeId(1), NodeId(0)]).unwrap();
    /// assert_eq!(itinerary.stop_positions(), &[0, 2]);
    ///
    /// // Stops out of path order are rejected
    /// assert!(Itinerary::new(path, vec![NodeId(0), NodeId(1)]).is_err());
    /// ```
    pub fn new(nodes: Vec<NodeId>, stops: Vec<NodeId>) -> Result<Self, NetworkError> {
        if nodes.len() < 2 {
            return Err(NetworkError::InvalidItinerary(
                "a direction needs at least two nodes".to_string(),
            ));
        }
        if let Some(pair) = nodes.windows(2).find(|w| w[0] == w[1]) {
            return Err(NetworkError::InvalidItinerary(format!(
                "node {} is repeated back to back",
                pair[0]
            )));
        }
        if stops.len() < 2 {
            return Err(NetworkError::InvalidItinerary(
                "a direction needs at least two stops".to_string(),
            ));
        }

        let mut stop_positions = Vec::with_capacity(stops.len());
        let mut next = 0;
        for stop in &stops {
            let found = nodes[next..]
                .iter()
                .position(|n| n == stop)
                .map(|offset| next + offset)
                .ok_or_else(|| {
                    NetworkError::InvalidItinerary(format!(
                        "stop {stop} is not on the node path in order"
                    ))
                })?;
            stop_positions.push(found);
            next = found + 1;
        }

        Ok(Self {
            nodes,
            stops,
            stop_positions,
        })
    }

    /// Parse comma-separated node and stop id lists.
    ///
    /// Returns `Ok(None)` when both lists are blank, meaning the direction is
    /// not served.
    pub fn parse(nodes: &str, stops: &str) -> Result<Option<Self>, NetworkError> {
        let nodes = parse_sequence(nodes)?;
        let stops = parse_sequence(stops)?;
        if nodes.is_empty() && stops.is_empty() {
            return Ok(None);
        }
        Self::new(nodes, stops).map(Some)
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn stops(&self) -> &[NodeId] {
        &self.stops
    }

    /// Index into `nodes` of each stop.
    pub fn stop_positions(&self) -> &[usize] {
        &self.stop_positions
    }

    /// Whether the path ends where it started.
    pub fn is_closed(&self) -> bool {
        self.nodes.first() == self.nodes.last()
    }

    /// Consecutive node pairs along the path.
    pub fn links(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes.windows(2).map(|w| (w[0], w[1]))
    }

    /// The node path between each pair of consecutive stops, both ends included.
    pub fn stop_segments(&self) -> impl Iterator<Item = &[NodeId]> + '_ {
        self.stop_positions
            .windows(2)
            .map(|w| &self.nodes[w[0]..=w[1]])
    }

    /// Node sequence as a comma-separated id list.
    pub fn nodes_text(&self) -> String {
        join_ids(&self.nodes)
    }

    /// Stop sequence as a comma-separated id list.
    pub fn stops_text(&self) -> String {
        join_ids(&self.stops)
    }
}

fn parse_sequence(text: &str) -> Result<Vec<NodeId>, NetworkError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|part| {
            let part = part.trim();
            part.parse().map(NodeId).map_err(|_| {
                NetworkError::InvalidItinerary(format!("invalid node id {part:?}"))
            })
        })
        .collect()
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// A candidate route.
///
/// # Invariants
///
/// - The name is not empty
/// - At least one direction is served
/// - A circular route has a single closed outbound direction
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    name: String,
    mode: Arc<TransportMode>,
    route_type: RouteType,
    outbound: Option<Itinerary>,
    inbound: Option<Itinerary>,
}

impl Route {
    pub fn new(
        name: impl Into<String>,
        mode: Arc<TransportMode>,
        route_type: RouteType,
        outbound: Option<Itinerary>,
        inbound: Option<Itinerary>,
    ) -> Result<Self, NetworkError> {
        let name = name.into();
        let invalid = |reason: &str| NetworkError::InvalidRoute {
            route: name.clone(),
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if outbound.is_none() && inbound.is_none() {
            return Err(invalid("at least one direction must be served"));
        }
        if route_type == RouteType::Circular {
            match (&outbound, &inbound) {
                (Some(itinerary), None) if itinerary.is_closed() => {}
                (Some(_), None) => {
                    return Err(invalid("a circular route must end where it starts"));
                }
                _ => {
                    return Err(invalid(
                        "a circular route has exactly one, outbound, direction",
                    ));
                }
            }
        }

        Ok(Self {
            name,
            mode,
            route_type,
            outbound,
            inbound,
        })
    }

    /// Build a route from comma-separated sequences, as stored.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use transit_optimizer::transit::{ModeParameters, Route, RouteType, TransportMode};
    ///
    /// let bus = Arc::new(TransportMode::new("bus", ModeParameters::bus()).unwrap());
    /// let route = Route::from_sequences("R1", bus, RouteType::Custom, "1,2,0", "1,0", "0,2,1", "0,1").unwrap();
    ///
    /// assert_eq!(route.directions().count(), 2);
    /// ```
    pub fn from_sequences(
        name: impl Into<String>,
        mode: Arc<TransportMode>,
        route_type: RouteType,
        nodes_outbound: &str,
        stops_outbound: &str,
        nodes_inbound: &str,
        stops_inbound: &str,
    ) -> Result<Self, NetworkError> {
        let name = name.into();
        let in_route = |err: NetworkError| NetworkError::InvalidRoute {
            route: name.clone(),
            reason: err.to_string(),
        };
        let outbound = Itinerary::parse(nodes_outbound, stops_outbound).map_err(in_route)?;
        let inbound = Itinerary::parse(nodes_inbound, stops_inbound).map_err(in_route)?;
        Self::new(name, mode, route_type, outbound, inbound)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> &Arc<TransportMode> {
        &self.mode
    }

    pub fn route_type(&self) -> RouteType {
        self.route_type
    }

    pub fn itinerary(&self, direction: Direction) -> Option<&Itinerary> {
        match direction {
            Direction::Outbound => self.outbound.as_ref(),
            Direction::Inbound => self.inbound.as_ref(),
        }
    }

    /// Served directions, outbound first.
    pub fn directions(&self) -> impl Iterator<Item = (Direction, &Itinerary)> + '_ {
        [Direction::Outbound, Direction::Inbound]
            .into_iter()
            .filter_map(|d| self.itinerary(d).map(|i| (d, i)))
    }

    /// Every node the route passes through, with repeats.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.directions()
            .flat_map(|(_, itinerary)| itinerary.nodes().iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transit::ModeParameters;

    fn bus() -> Arc<TransportMode> {
        Arc::new(TransportMode::new("bus", ModeParameters::bus()).unwrap())
    }

    fn ids(raw: &[usize]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId).collect()
    }

    #[test]
    fn route_type_codes() {
        for kind in [RouteType::Custom, RouteType::Predefined, RouteType::Circular] {
            assert_eq!(RouteType::from_code(kind.code()), Some(kind));
        }
        assert_eq!(RouteType::from_code(0), None);
        assert_eq!(RouteType::from_code(4), None);
    }

    #[test]
    fn itinerary_validation() {
        assert!(Itinerary::new(ids(&[1]), ids(&[1])).is_err());
        assert!(Itinerary::new(ids(&[1, 1, 2]), ids(&[1, 2])).is_err());
        assert!(Itinerary::new(ids(&[1, 2]), ids(&[1])).is_err());
        assert!(Itinerary::new(ids(&[1, 2, 3]), ids(&[1, 4])).is_err());
        assert!(Itinerary::new(ids(&[1, 2, 3]), ids(&[2, 2])).is_err());
    }

    #[test]
    fn closed_loop_stops() {
        let itinerary = Itinerary::new(ids(&[2, 4, 6, 2]), ids(&[2, 4, 6, 2])).unwrap();
        assert!(itinerary.is_closed());
        assert_eq!(itinerary.stop_positions(), &[0, 1, 2, 3]);
    }

    #[test]
    fn stop_segments_cover_skipped_nodes() {
        let itinerary = Itinerary::new(ids(&[1, 2, 0, 4, 3]), ids(&[1, 0, 3])).unwrap();
        let segments: Vec<_> = itinerary.stop_segments().collect();
        assert_eq!(segments, vec![&ids(&[1, 2, 0])[..], &ids(&[0, 4, 3])[..]]);
        assert_eq!(itinerary.links().count(), 4);
    }

    #[test]
    fn parse_sequences() {
        let itinerary = Itinerary::parse(" 1, 2 ,0", "1,0").unwrap().unwrap();
        assert_eq!(itinerary.nodes(), &ids(&[1, 2, 0])[..]);
        assert_eq!(itinerary.nodes_text(), "1,2,0");
        assert_eq!(itinerary.stops_text(), "1,0");

        assert_eq!(Itinerary::parse("", "  ").unwrap(), None);

        let err = Itinerary::parse("1,x", "1").unwrap_err();
        assert_eq!(
            err,
            NetworkError::InvalidItinerary("invalid node id \"x\"".to_string())
        );
        // Nodes without stops is not a blank direction
        assert!(Itinerary::parse("1,2", "").is_err());
    }

    #[test]
    fn route_needs_a_direction() {
        let err = Route::new("R1", bus(), RouteType::Custom, None, None).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidRoute { .. }));

        let err = Route::new("", bus(), RouteType::Custom, None, None).unwrap_err();
        assert!(err.to_string().contains("name must not be empty"));
    }

    #[test]
    fn inbound_only_route() {
        let route = Route::from_sequences("R1", bus(), RouteType::Custom, "", "", "0,2", "0,2").unwrap();
        let directions: Vec<_> = route.directions().map(|(d, _)| d).collect();
        assert_eq!(directions, vec![Direction::Inbound]);
    }

    #[test]
    fn circular_routes_are_single_closed_loops() {
        assert!(
            Route::from_sequences("C", bus(), RouteType::Circular, "2,4,6,2", "2,4,6,2", "", "")
                .is_ok()
        );
        assert!(
            Route::from_sequences("C", bus(), RouteType::Circular, "2,4,6", "2,4,6", "", "")
                .is_err()
        );
        assert!(
            Route::from_sequences(
                "C",
                bus(),
                RouteType::Circular,
                "2,4,6,2",
                "2,4,6,2",
                "2,6,4,2",
                "2,6,4,2"
            )
            .is_err()
        );
    }

    #[test]
    fn sequence_errors_name_the_route() {
        let err =
            Route::from_sequences("R9", bus(), RouteType::Custom, "1,2", "2,1", "", "").unwrap_err();
        match err {
            NetworkError::InvalidRoute { route, reason } => {
                assert_eq!(route, "R9");
                assert!(reason.contains("stop 1 is not on the node path"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn nodes_across_directions() {
        let route =
            Route::from_sequences("R1", bus(), RouteType::Custom, "1,2", "1,2", "2,1", "2,1").unwrap();
        assert_eq!(route.nodes().collect::<Vec<_>>(), ids(&[1, 2, 2, 1]));
    }
}
