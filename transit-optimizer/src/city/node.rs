//! Zone nodes of the city graph.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense node identifier, the node's position in its graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classification of a zone within the city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// The central business district
    Center,
    /// A subcenter on the ring around the CBD
    Subcenter,
    /// An outer periphery zone
    Periphery,
}

impl NodeKind {
    /// Returns the type code used in the Pajek interchange format.
    pub fn code(self) -> u8 {
        match self {
            NodeKind::Center => 0,
            NodeKind::Periphery => 1,
            NodeKind::Subcenter => 2,
        }
    }

    /// Decode a Pajek type code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NodeKind::Center),
            1 => Some(NodeKind::Periphery),
            2 => Some(NodeKind::Subcenter),
            _ => None,
        }
    }
}

/// A zone of the city: an origin and destination of trips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Position in the graph's node list
    pub id: NodeId,
    /// Display name, unique within the graph (e.g. "CBD", "SC_3")
    pub name: String,
    /// Horizontal position (km)
    pub x: f64,
    /// Vertical position (km)
    pub y: f64,
    /// Zone classification
    pub kind: NodeKind,
    /// Zone number; 0 for the CBD
    pub zone: usize,
    /// Relative trip-generation weight
    pub weight: f64,
}

impl Node {
    /// Create a node with unit weight.
    pub fn new(
        id: NodeId,
        name: impl Into<String>,
        x: f64,
        y: f64,
        kind: NodeKind,
        zone: usize,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            x,
            y,
            kind,
            zone,
            weight: 1.0,
        }
    }

    /// Straight-line distance to another node (km).
    pub fn distance_to(&self, other: &Node) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}
