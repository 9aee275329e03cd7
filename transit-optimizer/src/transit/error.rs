//! Transit model error types.

use crate::city::NodeId;

/// Validation failures for passengers, modes, routes and networks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    /// A transport mode parameter is out of range
    #[error("invalid transport mode {mode}: {reason}")]
    InvalidMode { mode: String, reason: String },

    /// A passenger coefficient is out of range
    #[error("invalid passenger profile: {0}")]
    InvalidPassenger(String),

    /// A node or stop sequence is malformed
    #[error("invalid itinerary: {0}")]
    InvalidItinerary(String),

    /// A route is malformed
    #[error("invalid route {route}: {reason}")]
    InvalidRoute { route: String, reason: String },

    /// A route visits a node the graph does not have
    #[error("route {route} references unknown node {node}")]
    UnknownNode { route: String, node: NodeId },

    /// A route moves between nodes with no graph edge
    #[error("route {route} uses missing edge {from}->{to}")]
    MissingEdge {
        route: String,
        from: NodeId,
        to: NodeId,
    },

    /// A route edge has zero length
    #[error("route {route} uses zero-length edge {from}->{to}")]
    DegenerateEdge {
        route: String,
        from: NodeId,
        to: NodeId,
    },

    /// A route's transport mode is not registered with the network
    #[error("route {route} uses transport mode {mode}, which is not part of the network")]
    UnknownMode { route: String, mode: String },

    /// A transport mode is not registered with the network
    #[error("transport mode {0} is not part of the network")]
    UnregisteredMode(String),

    /// Route names are unique within a network
    #[error("route {0} already exists in the network")]
    DuplicateRoute(String),

    /// Mode names are unique within a network
    #[error("transport mode {0} already exists in the network")]
    DuplicateMode(String),

    /// A route generator cannot be applied to this network
    #[error("cannot generate routes: {0}")]
    Generator(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = NetworkError::InvalidMode {
            mode: "bus".into(),
            reason: "v must be positive".into(),
        };
        assert_eq!(err.to_string(), "invalid transport mode bus: v must be positive");

        let err = NetworkError::MissingEdge {
            route: "R1".into(),
            from: NodeId(1),
            to: NodeId(4),
        };
        assert_eq!(err.to_string(), "route R1 uses missing edge 1->4");

        let err = NetworkError::UnknownMode {
            route: "R1".into(),
            mode: "tram".into(),
        };
        assert_eq!(
            err.to_string(),
            "route R1 uses transport mode tram, which is not part of the network"
        );

        let err = NetworkError::DuplicateRoute("R1".into());
        assert_eq!(err.to_string(), "route R1 already exists in the network");
    }
}
