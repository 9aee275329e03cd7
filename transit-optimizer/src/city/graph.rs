//! The city graph: zones connected by directed road links.
//!
//! Graphs built from structural parameters have a star-and-ring topology
//! (CBD to subcenters, subcenters to their peripheries, subcenters to their
//! ring neighbours), but everything downstream treats a `Graph` as a general
//! directed graph.

use std::collections::HashMap;
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::error::parse_float;
use super::{CityError, Node, NodeId, NodeKind, pajek};

/// Upper bound on the number of zones a graph may have.
pub const MAX_ZONES: usize = 5000;

/// Dense edge identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EdgeId(pub usize);

/// A directed link between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    /// Straight-line length between the endpoints (km)
    pub length: f64,
}

/// An immutable city graph.
///
/// # Invariants
///
/// - Node ids are dense and contiguous from 0, matching list position
/// - Node names are unique
/// - Edges reference existing nodes, never loop, and are not duplicated
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    by_name: HashMap<String, NodeId>,
}

impl Graph {
    /// Build a graph from nodes and directed links.
    ///
    /// Edge lengths are the straight-line distance between endpoints.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_optimizer::city::{Graph, Node, NodeId, NodeKind};
    ///
    /// let nodes = vec![
    ///     Node::new(NodeId(0), "CBD", 0.0, 0.0, NodeKind::Center, 0),
    ///     Node::new(NodeId(1), "P_1", 3.0, 4.0, NodeKind::Periphery, 1),
    /// ];
    /// let graph = Graph::new(nodes, &[(NodeId(1), NodeId(0))]).unwrap();
    ///
    /// assert_eq!(graph.node_count(), 2);
    /// assert_eq!(graph.edge_between(NodeId(1), NodeId(0)).unwrap().length, 5.0);
    /// assert!(graph.edge_between(NodeId(0), NodeId(1)).is_none());
    /// ```
    pub fn new(nodes: Vec<Node>, links: &[(NodeId, NodeId)]) -> Result<Self, CityError> {
        let mut by_name = HashMap::with_capacity(nodes.len());

        for (idx, node) in nodes.iter().enumerate() {
            if node.id.0 != idx {
                return Err(CityError::Validation(format!(
                    "node ids must be contiguous from 0: found {} at position {idx}",
                    node.id
                )));
            }
            if node.name.is_empty() || node.name.chars().any(char::is_whitespace) {
                return Err(CityError::Validation(format!(
                    "node {} needs a non-empty name without whitespace",
                    node.id
                )));
            }
            if !node.x.is_finite() || !node.y.is_finite() {
                return Err(CityError::Validation(format!(
                    "node {} has non-finite coordinates",
                    node.name
                )));
            }
            if !node.weight.is_finite() || node.weight < 0.0 {
                return Err(CityError::Validation(format!(
                    "node {} weight must be non-negative",
                    node.name
                )));
            }
            if by_name.insert(node.name.clone(), node.id).is_some() {
                return Err(CityError::Validation(format!(
                    "duplicate node name {}",
                    node.name
                )));
            }
        }

        let mut edges: Vec<Edge> = Vec::with_capacity(links.len());
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

        for &(from, to) in links {
            let (Some(a), Some(b)) = (nodes.get(from.0), nodes.get(to.0)) else {
                return Err(CityError::Validation(format!(
                    "edge {from}->{to} references an unknown node"
                )));
            };
            if from == to {
                return Err(CityError::Validation(format!("edge {from}->{to} is a loop")));
            }
            if outgoing[from.0]
                .iter()
                .any(|&e| edges[e].to == to)
            {
                return Err(CityError::Validation(format!(
                    "duplicate edge {from}->{to}"
                )));
            }

            let idx = edges.len();
            edges.push(Edge {
                id: EdgeId(idx),
                from,
                to,
                length: a.distance_to(b),
            });
            outgoing[from.0].push(idx);
            incoming[to.0].push(idx);
        }

        Ok(Self {
            nodes,
            edges,
            outgoing,
            incoming,
            by_name,
        })
    }

    /// Build a graph whose edges follow the city structure.
    ///
    /// Nodes must contain one CBD plus one subcenter and one periphery for
    /// every zone `1..=n`. Links: CBD↔SC_z, SC_z↔P_z and SC_z↔SC_{z+1}
    /// around the ring.
    pub(crate) fn from_structure(nodes: Vec<Node>) -> Result<Self, CityError> {
        let links = structural_links(&nodes)?;
        Self::new(nodes, &links)
    }

    /// Build a synthetic city from structural parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_optimizer::city::{Graph, GraphParameters, NodeKind};
    ///
    /// let graph = Graph::build_from_parameters(&GraphParameters::new(4, 10.0, 0.5, 2.0)).unwrap();
    ///
    /// assert_eq!(graph.node_count(), 9);
    /// assert_eq!(graph.zone_count(), 4);
    /// assert_eq!(graph.center().unwrap().name, "CBD");
    /// assert_eq!(graph.zone_node(NodeKind::Subcenter, 2).unwrap().name, "SC_2");
    /// ```
    pub fn build_from_parameters(params: &GraphParameters) -> Result<Self, CityError> {
        let n = params.validate()?;
        let angles = params.zone_angles(n)?;

        let mut nodes = Vec::with_capacity(2 * n + 1);
        nodes.push(Node::new(NodeId(0), "CBD", 0.0, 0.0, NodeKind::Center, 0));

        for (z, angle) in angles.iter().enumerate() {
            let zone = z + 1;
            let gi = params.gi.as_ref().map_or(1.0, |v| v[z]);
            let hi = params.hi.as_ref().map_or(1.0, |v| v[z]);
            let sc_radius = params.l * gi;
            let p_radius = sc_radius + params.g * params.l * hi + params.p;
            let (sin, cos) = angle.sin_cos();

            nodes.push(Node::new(
                NodeId(2 * zone - 1),
                format!("P_{zone}"),
                snap(p_radius * cos),
                snap(p_radius * sin),
                NodeKind::Periphery,
                zone,
            ));
            nodes.push(Node::new(
                NodeId(2 * zone),
                format!("SC_{zone}"),
                snap(sc_radius * cos),
                snap(sc_radius * sin),
                NodeKind::Subcenter,
                zone,
            ));
        }

        Self::from_structure(nodes)
    }

    /// Parse a graph from Pajek-style vertex text.
    pub fn build_from_pajek(text: &str) -> Result<Self, CityError> {
        pajek::parse(text)
    }

    /// Export the graph's vertices as Pajek-style text.
    pub fn to_pajek(&self) -> String {
        pajek::export(self)
    }

    /// Check whether a Pajek text describes exactly the graph the parameters build.
    pub fn matches_parameters(text: &str, params: &GraphParameters) -> Result<bool, CityError> {
        let built = Self::build_from_parameters(params)?;
        Ok(built.to_pajek() == text)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges in id order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Look up a node by name.
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.by_name.get(name).and_then(|id| self.node(*id))
    }

    /// Returns the first center node, if any.
    pub fn center(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.kind == NodeKind::Center)
    }

    /// Returns the node of the given kind in a zone.
    pub fn zone_node(&self, kind: NodeKind, zone: usize) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|n| n.kind == kind && n.zone == zone)
    }

    /// Returns the highest zone number in the graph.
    pub fn zone_count(&self) -> usize {
        self.nodes.iter().map(|n| n.zone).max().unwrap_or(0)
    }

    /// Returns the directed edge from `from` to `to`, if present.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.outgoing
            .get(from.0)?
            .iter()
            .map(|&e| &self.edges[e])
            .find(|e| e.to == to)
    }

    /// Edges leaving a node.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing
            .get(id.0)
            .into_iter()
            .flatten()
            .map(|&e| &self.edges[e])
    }

    /// Edges entering a node.
    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming
            .get(id.0)
            .into_iter()
            .flatten()
            .map(|&e| &self.edges[e])
    }

    /// Node and edge lists for front-end drawing.
    pub fn descriptor(&self) -> GraphDescriptor {
        GraphDescriptor {
            nodes: self
                .nodes
                .iter()
                .map(|n| NodeDescriptor {
                    id: n.id,
                    name: n.name.clone(),
                    x: n.x,
                    y: n.y,
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeDescriptor {
                    id: e.id,
                    source: e.from,
                    target: e.to,
                })
                .collect(),
        }
    }

    /// Node names in id order, labelling demand matrix rows and columns.
    pub fn demand_matrix_header(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }
}

/// Node and edge lists describing a graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphDescriptor {
    pub nodes: Vec<NodeDescriptor>,
    pub edges: Vec<EdgeDescriptor>,
}

/// A node as drawn by a front-end.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDescriptor {
    pub id: NodeId,
    pub name: String,
    pub x: f64,
    pub y: f64,
}

/// An edge as drawn by a front-end.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeDescriptor {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

/// Structural parameters of a synthetic city.
///
/// Zone `z` sits at angle `2π(z-1)/n`. Its subcenter is at radius `l·gi[z]`
/// and its periphery a further `g·l·hi[z] + p` out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphParameters {
    /// Number of zones
    pub n: i64,
    /// CBD to subcenter distance (km)
    pub l: f64,
    /// Subcenter to periphery distance as a fraction of `l`
    pub g: f64,
    /// Extra periphery offset (km)
    pub p: f64,

    /// Angular compression of the first `etha_zone` zones, in `[0, 1)`
    #[serde(default)]
    pub etha: Option<f64>,
    /// Number of zones affected by `etha`
    #[serde(default)]
    pub etha_zone: Option<usize>,
    /// Explicit zone angles in degrees, one per zone
    #[serde(default)]
    pub angles: Option<Vec<f64>>,
    /// Per-zone subcenter radius multipliers
    #[serde(default)]
    pub gi: Option<Vec<f64>>,
    /// Per-zone periphery distance multipliers
    #[serde(default)]
    pub hi: Option<Vec<f64>>,
}

impl GraphParameters {
    /// Symmetric city parameters.
    pub fn new(n: i64, l: f64, g: f64, p: f64) -> Self {
        Self {
            n,
            l,
            g,
            p,
            etha: None,
            etha_zone: None,
            angles: None,
            gi: None,
            hi: None,
        }
    }

    /// Parse parameters from text fields.
    pub fn parse(n: &str, l: &str, g: &str, p: &str) -> Result<Self, CityError> {
        let n: i64 = n
            .trim()
            .parse()
            .map_err(|_| CityError::Validation("n must be an integer".to_string()))?;
        Ok(Self::new(
            n,
            parse_float("l", l)?,
            parse_float("g", g)?,
            parse_float("p", p)?,
        ))
    }

    /// Compress the angular spacing of the first `etha_zone` zones.
    pub fn with_asymmetry(mut self, etha: f64, etha_zone: usize) -> Self {
        self.etha = Some(etha);
        self.etha_zone = Some(etha_zone);
        self
    }

    /// Place zones at explicit angles (degrees).
    pub fn with_angles(mut self, angles: Vec<f64>) -> Self {
        self.angles = Some(angles);
        self
    }

    /// Scale subcenter radii (`gi`) and periphery distances (`hi`) per zone.
    pub fn with_zone_scales(mut self, gi: Vec<f64>, hi: Vec<f64>) -> Self {
        self.gi = Some(gi);
        self.hi = Some(hi);
        self
    }

    /// Validate and return the zone count.
    fn validate(&self) -> Result<usize, CityError> {
        if self.n < 0 {
            return Err(CityError::Validation("n must be non-negative".to_string()));
        }
        let n = self.n as usize;
        if n > MAX_ZONES {
            return Err(CityError::Validation(format!(
                "n must be at most {MAX_ZONES}"
            )));
        }
        if !self.l.is_finite() || self.l <= 0.0 {
            return Err(CityError::Validation("l must be positive".to_string()));
        }
        if !self.g.is_finite() || self.g <= 0.0 {
            return Err(CityError::Validation("g must be positive".to_string()));
        }
        if !self.p.is_finite() || self.p < 0.0 {
            return Err(CityError::Validation("p must be non-negative".to_string()));
        }

        for (field, values) in [("gi", &self.gi), ("hi", &self.hi)] {
            if let Some(values) = values {
                if values.len() != n {
                    return Err(CityError::Validation(format!(
                        "{field} must have one value per zone"
                    )));
                }
                if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                    return Err(CityError::Validation(format!(
                        "{field} values must be positive"
                    )));
                }
            }
        }

        Ok(n)
    }

    /// Zone angles in radians.
    fn zone_angles(&self, n: usize) -> Result<Vec<f64>, CityError> {
        if let Some(angles) = &self.angles {
            if angles.len() != n {
                return Err(CityError::Validation(
                    "angles must have one value per zone".to_string(),
                ));
            }
            if angles.iter().any(|a| !a.is_finite()) {
                return Err(CityError::Validation("angles must be finite".to_string()));
            }
            return Ok(angles.iter().map(|a| a.to_radians()).collect());
        }

        if n == 0 {
            return Ok(Vec::new());
        }
        let step = TAU / n as f64;

        match (self.etha, self.etha_zone) {
            (None, None) => Ok((0..n).map(|z| step * z as f64).collect()),
            (Some(etha), Some(affected)) => {
                if !(0.0..1.0).contains(&etha) {
                    return Err(CityError::Validation(
                        "etha must be in [0, 1)".to_string(),
                    ));
                }
                if affected == 0 || affected > n {
                    return Err(CityError::Validation(format!(
                        "etha_zone must be between 1 and {n}"
                    )));
                }

                let compressed = step * (1.0 - etha);
                let rest = if affected < n {
                    (TAU - compressed * affected as f64) / (n - affected) as f64
                } else {
                    0.0
                };

                let mut angle = 0.0;
                let mut out = Vec::with_capacity(n);
                for z in 0..n {
                    out.push(angle);
                    angle += if z < affected { compressed } else { rest };
                }
                Ok(out)
            }
            _ => Err(CityError::Validation(
                "etha and etha_zone must be given together".to_string(),
            )),
        }
    }
}

/// Round a coordinate to the micrometre grid so exports stay short and stable.
fn snap(v: f64) -> f64 {
    let s = (v * 1e6).round() / 1e6;
    if s == 0.0 { 0.0 } else { s }
}

/// Directed links of the standard star-and-ring city structure.
fn structural_links(nodes: &[Node]) -> Result<Vec<(NodeId, NodeId)>, CityError> {
    let mut centers = nodes.iter().filter(|n| n.kind == NodeKind::Center);
    let cbd = match (centers.next(), centers.next()) {
        (Some(c), None) => c.id,
        (None, _) => return Err(CityError::Format("graph has no CBD node".to_string())),
        (Some(_), Some(_)) => {
            return Err(CityError::Format("graph has more than one CBD node".to_string()));
        }
    };

    let n = nodes.iter().map(|node| node.zone).max().unwrap_or(0);
    let mut subcenters = vec![None; n];
    let mut peripheries = vec![None; n];

    for node in nodes.iter().filter(|n| n.kind != NodeKind::Center) {
        if node.zone == 0 {
            return Err(CityError::Format(format!(
                "node {} must belong to a zone >= 1",
                node.name
            )));
        }
        let slot = match node.kind {
            NodeKind::Subcenter => &mut subcenters[node.zone - 1],
            _ => &mut peripheries[node.zone - 1],
        };
        if slot.replace(node.id).is_some() {
            return Err(CityError::Format(format!(
                "zone {} has more than one {:?} node",
                node.zone, node.kind
            )));
        }
    }

    let mut undirected = Vec::with_capacity(3 * n);
    for z in 0..n {
        let (Some(sc), Some(p)) = (subcenters[z], peripheries[z]) else {
            return Err(CityError::Format(format!(
                "zone {} needs one subcenter and one periphery",
                z + 1
            )));
        };
        undirected.push((cbd, sc));
        undirected.push((sc, p));
    }

    let ring_links = match n {
        0 | 1 => 0,
        2 => 1,
        _ => n,
    };
    for z in 0..ring_links {
        if let (Some(a), Some(b)) = (subcenters[z], subcenters[(z + 1) % n]) {
            undirected.push((a, b));
        }
    }

    Ok(undirected
        .into_iter()
        .flat_map(|(a, b)| [(a, b), (b, a)])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_nodes() -> Vec<Node> {
        vec![
            Node::new(NodeId(0), "CBD", 0.0, 0.0, NodeKind::Center, 0),
            Node::new(NodeId(1), "P_1", 10.0, 0.0, NodeKind::Periphery, 1),
        ]
    }

    #[test]
    fn build_symmetric_city() {
        let graph = Graph::build_from_parameters(&GraphParameters::new(4, 10.0, 0.5, 2.0)).unwrap();

        assert_eq!(graph.node_count(), 9);
        // 4 radial + 4 feeder + 4 ring links, both directions
        assert_eq!(graph.edges().len(), 24);

        let sc1 = graph.zone_node(NodeKind::Subcenter, 1).unwrap();
        assert_eq!((sc1.x, sc1.y), (10.0, 0.0));
        let p1 = graph.zone_node(NodeKind::Periphery, 1).unwrap();
        assert_eq!((p1.x, p1.y), (17.0, 0.0));

        let sc2 = graph.zone_node(NodeKind::Subcenter, 2).unwrap();
        assert_eq!((sc2.x, sc2.y), (0.0, 10.0));
    }

    #[test]
    fn ids_follow_zone_layout() {
        let graph = Graph::build_from_parameters(&GraphParameters::new(3, 5.0, 1.0, 0.0)).unwrap();
        let names: Vec<_> = graph.demand_matrix_header();
        assert_eq!(names, ["CBD", "P_1", "SC_1", "P_2", "SC_2", "P_3", "SC_3"]);
        assert_eq!(graph.node_by_name("SC_2").unwrap().id, NodeId(4));
    }

    #[test]
    fn small_rings() {
        let one = Graph::build_from_parameters(&GraphParameters::new(1, 5.0, 1.0, 0.0)).unwrap();
        assert_eq!(one.edges().len(), 4);

        let two = Graph::build_from_parameters(&GraphParameters::new(2, 5.0, 1.0, 0.0)).unwrap();
        assert_eq!(two.edges().len(), 10);

        let empty = Graph::build_from_parameters(&GraphParameters::new(0, 5.0, 1.0, 0.0)).unwrap();
        assert_eq!(empty.node_count(), 1);
        assert!(empty.edges().is_empty());
    }

    #[test]
    fn reject_bad_parameters() {
        let err = Graph::build_from_parameters(&GraphParameters::new(-1, 5.0, 1.0, 0.0));
        assert!(matches!(err, Err(CityError::Validation(_))));

        assert!(Graph::build_from_parameters(&GraphParameters::new(2, 0.0, 1.0, 0.0)).is_err());
        assert!(Graph::build_from_parameters(&GraphParameters::new(2, 5.0, -1.0, 0.0)).is_err());
        assert!(Graph::build_from_parameters(&GraphParameters::new(2, 5.0, 1.0, -0.5)).is_err());
        assert!(
            Graph::build_from_parameters(&GraphParameters::new(2, f64::NAN, 1.0, 0.0)).is_err()
        );
    }

    #[test]
    fn parse_text_parameters() {
        let params = GraphParameters::parse("4", "10", "0.5", "2").unwrap();
        assert_eq!(params, GraphParameters::new(4, 10.0, 0.5, 2.0));

        assert!(GraphParameters::parse("-", "10", "0.5", "2").is_err());
        assert_eq!(
            GraphParameters::parse("4", "ten", "0.5", "2").unwrap_err(),
            CityError::Validation("l must be a number".to_string())
        );
    }

    #[test]
    fn asymmetric_angles() {
        let params = GraphParameters::new(4, 10.0, 1.0, 0.0).with_asymmetry(0.5, 2);
        let graph = Graph::build_from_parameters(&params).unwrap();

        // First two zones are 45 degrees apart instead of 90
        let sc2 = graph.zone_node(NodeKind::Subcenter, 2).unwrap();
        let expected = 10.0 * std::f64::consts::FRAC_PI_4.cos();
        assert!((sc2.x - expected).abs() < 1e-6);
        assert!((sc2.y - expected).abs() < 1e-6);

        let bad = GraphParameters::new(4, 10.0, 1.0, 0.0).with_asymmetry(1.5, 2);
        assert!(Graph::build_from_parameters(&bad).is_err());

        let bad = GraphParameters::new(4, 10.0, 1.0, 0.0).with_asymmetry(0.5, 5);
        assert!(Graph::build_from_parameters(&bad).is_err());
    }

    #[test]
    fn explicit_angles_and_scales() {
        let params = GraphParameters::new(2, 10.0, 1.0, 0.0)
            .with_angles(vec![0.0, 90.0])
            .with_zone_scales(vec![1.0, 2.0], vec![1.0, 0.5]);
        let graph = Graph::build_from_parameters(&params).unwrap();

        let sc2 = graph.zone_node(NodeKind::Subcenter, 2).unwrap();
        assert_eq!((sc2.x, sc2.y), (0.0, 20.0));
        let p2 = graph.zone_node(NodeKind::Periphery, 2).unwrap();
        assert_eq!((p2.x, p2.y), (0.0, 25.0));

        let short = GraphParameters::new(2, 10.0, 1.0, 0.0).with_angles(vec![0.0]);
        assert!(Graph::build_from_parameters(&short).is_err());
    }

    #[test]
    fn general_graph_validation() {
        let graph = Graph::new(two_node_nodes(), &[(NodeId(1), NodeId(0))]).unwrap();
        assert_eq!(graph.outgoing(NodeId(1)).count(), 1);
        assert_eq!(graph.incoming(NodeId(0)).count(), 1);
        assert_eq!(graph.outgoing(NodeId(0)).count(), 0);

        assert!(Graph::new(two_node_nodes(), &[(NodeId(1), NodeId(2))]).is_err());
        assert!(Graph::new(two_node_nodes(), &[(NodeId(1), NodeId(1))]).is_err());
        assert!(
            Graph::new(
                two_node_nodes(),
                &[(NodeId(1), NodeId(0)), (NodeId(1), NodeId(0))]
            )
            .is_err()
        );

        let mut misnumbered = two_node_nodes();
        misnumbered[1].id = NodeId(5);
        assert!(Graph::new(misnumbered, &[]).is_err());

        let mut duplicate = two_node_nodes();
        duplicate[1].name = "CBD".to_string();
        assert!(Graph::new(duplicate, &[]).is_err());
    }

    #[test]
    fn duplicate_link_is_detected_among_existing_edges() {
        let mut nodes = two_node_nodes();
        nodes.push(Node::new(NodeId(2), "SC_1", 5.0, 0.0, NodeKind::Subcenter, 1));
        let links = [
            (NodeId(0), NodeId(1)),
            (NodeId(0), NodeId(2)),
            (NodeId(2), NodeId(0)),
        ];

        let graph = Graph::new(nodes.clone(), &links).unwrap();
        let lengths: Vec<f64> = graph.edges().iter().map(|e| e.length).collect();
        assert_eq!(lengths, [10.0, 5.0, 5.0]);
        assert_eq!(graph.edge_between(NodeId(0), NodeId(2)).unwrap().id, EdgeId(1));

        let mut repeated = links.to_vec();
        repeated.push((NodeId(0), NodeId(2)));
        assert_eq!(
            Graph::new(nodes, &repeated).unwrap_err(),
            CityError::Validation("duplicate edge 0->2".to_string())
        );
    }

    #[test]
    fn descriptor_lists_everything() {
        let graph = Graph::build_from_parameters(&GraphParameters::new(2, 5.0, 1.0, 0.0)).unwrap();
        let descriptor = graph.descriptor();
        assert_eq!(descriptor.nodes.len(), 5);
        assert_eq!(descriptor.edges.len(), 10);
        assert_eq!(descriptor.edges[0].source, NodeId(0));
        assert_eq!(descriptor.edges[0].target, NodeId(2));
    }

    #[test]
    fn matches_parameters_detects_drift() {
        let params = GraphParameters::new(3, 5.0, 1.0, 1.0);
        let text = Graph::build_from_parameters(&params).unwrap().to_pajek();

        assert!(Graph::matches_parameters(&text, &params).unwrap());
        assert!(!Graph::matches_parameters(&text, &GraphParameters::new(3, 6.0, 1.0, 1.0)).unwrap());
    }
}
