//! Candidate route templates over the CBD/subcenter/periphery structure.
//!
//! Generators only build routes. Nothing is added to the network until the
//! caller passes the result to [`TransitNetwork::add_routes`].

use std::sync::Arc;

use serde::Deserialize;

use super::{Itinerary, NetworkError, Route, RouteType, TransitNetwork, TransportMode};
use crate::city::{NodeId, NodeKind};

/// Shape options for radial, diametral and tangential routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouteShape {
    /// Start and end at subcenters instead of peripheries
    pub short: bool,
    /// Stop only at the ends (and the CBD for routes through it)
    pub express: bool,
}

impl RouteShape {
    fn prefix(self, base: char) -> String {
        let mut prefix = String::from(base);
        if self.short {
            prefix.push('S');
        }
        if self.express {
            prefix.push('E');
        }
        prefix
    }
}

/// Zone node ids of a city with the standard structure.
struct Zones {
    cbd: NodeId,
    subcenters: Vec<NodeId>,
    peripheries: Vec<NodeId>,
}

impl Zones {
    fn of(network: &TransitNetwork) -> Result<Self, NetworkError> {
        let graph = network.graph();
        let cbd = graph
            .center()
            .map(|n| n.id)
            .ok_or_else(|| NetworkError::Generator("the graph has no CBD".to_string()))?;

        let n = graph.zone_count();
        let mut subcenters = Vec::with_capacity(n);
        let mut peripheries = Vec::with_capacity(n);
        for zone in 1..=n {
            let (Some(sc), Some(p)) = (
                graph.zone_node(NodeKind::Subcenter, zone),
                graph.zone_node(NodeKind::Periphery, zone),
            ) else {
                return Err(NetworkError::Generator(format!(
                    "zone {zone} needs a subcenter and a periphery"
                )));
            };
            subcenters.push(sc.id);
            peripheries.push(p.id);
        }

        Ok(Self {
            cbd,
            subcenters,
            peripheries,
        })
    }

    fn count(&self) -> usize {
        self.subcenters.len()
    }

    /// Subcenter of a zone numbered from 1, wrapping around the ring.
    fn sc(&self, zone: usize) -> NodeId {
        self.subcenters[(zone - 1) % self.count()]
    }

    fn p(&self, zone: usize) -> NodeId {
        self.peripheries[(zone - 1) % self.count()]
    }
}

fn registered(network: &TransitNetwork, mode: &Arc<TransportMode>) -> Result<(), NetworkError> {
    match network.mode(mode.name()) {
        Some(m) if **m == **mode => Ok(()),
        _ => Err(NetworkError::UnregisteredMode(mode.name().to_string())),
    }
}

fn check_jump(zone_jump: usize, zones: usize) -> Result<(), NetworkError> {
    if zone_jump == 0 || zone_jump >= zones {
        return Err(NetworkError::Generator(format!(
            "zone jump must be between 1 and {}, got {zone_jump}",
            zones.saturating_sub(1)
        )));
    }
    Ok(())
}

/// A predefined route serving `nodes` outbound and the reverse inbound.
fn two_way(
    name: String,
    mode: &Arc<TransportMode>,
    nodes: Vec<NodeId>,
    stops: Vec<NodeId>,
) -> Result<Route, NetworkError> {
    let back_nodes: Vec<_> = nodes.iter().rev().copied().collect();
    let back_stops: Vec<_> = stops.iter().rev().copied().collect();
    Route::new(
        name,
        Arc::clone(mode),
        RouteType::Predefined,
        Some(Itinerary::new(nodes, stops)?),
        Some(Itinerary::new(back_nodes, back_stops)?),
    )
}

/// Stops for a path: every node, or only the ends plus any `keep` node.
fn stops_for(nodes: &[NodeId], express: bool, keep: Option<NodeId>) -> Vec<NodeId> {
    let last = nodes.len() - 1;
    nodes
        .iter()
        .enumerate()
        .filter(|&(i, n)| !express || i == 0 || i == last || Some(*n) == keep)
        .map(|(_, &n)| n)
        .collect()
}

/// One route per zone linking its periphery and subcenter.
///
/// A periphery whose zone has no subcenter feeds the CBD directly. Zones
/// without a periphery get no feeder.
pub fn feeder_routes(
    network: &TransitNetwork,
    mode: &Arc<TransportMode>,
) -> Result<Vec<Route>, NetworkError> {
    registered(network, mode)?;
    let graph = network.graph();
    let cbd = graph
        .center()
        .map(|n| n.id)
        .ok_or_else(|| NetworkError::Generator("the graph has no CBD".to_string()))?;

    (1..=graph.zone_count())
        .filter_map(|z| {
            let p = graph.zone_node(NodeKind::Periphery, z)?.id;
            let hub = graph.zone_node(NodeKind::Subcenter, z).map_or(cbd, |sc| sc.id);
            let nodes = vec![p, hub];
            Some(two_way(format!("F_{}_{z}", mode.name()), mode, nodes.clone(), nodes))
        })
        .collect()
}

/// One route per zone into the CBD.
///
/// Long routes start at the periphery, short ones at the subcenter.
pub fn radial_routes(
    network: &TransitNetwork,
    mode: &Arc<TransportMode>,
    shape: RouteShape,
) -> Result<Vec<Route>, NetworkError> {
    registered(network, mode)?;
    let zones = Zones::of(network)?;
    let prefix = shape.prefix('R');
    (1..=zones.count())
        .map(|z| {
            let mut nodes = Vec::with_capacity(3);
            if !shape.short {
                nodes.push(zones.p(z));
            }
            nodes.extend([zones.sc(z), zones.cbd]);
            let stops = stops_for(&nodes, shape.express, None);
            two_way(format!("{prefix}_{}_{z}", mode.name()), mode, nodes, stops)
        })
        .collect()
}

/// Routes crossing the CBD between zone `z` and zone `z + zone_jump`.
///
/// Each unordered zone pair is generated once.
pub fn diametral_routes(
    network: &TransitNetwork,
    mode: &Arc<TransportMode>,
    zone_jump: usize,
    shape: RouteShape,
) -> Result<Vec<Route>, NetworkError> {
    registered(network, mode)?;
    let zones = Zones::of(network)?;
    let n = zones.count();
    check_jump(zone_jump, n)?;
    let prefix = shape.prefix('D');

    let mut routes = Vec::new();
    let mut seen = Vec::new();
    for z in 1..=n {
        let j = (z - 1 + zone_jump) % n + 1;
        let pair = (z.min(j), z.max(j));
        if seen.contains(&pair) {
            continue;
        }
        seen.push(pair);

        let mut nodes = Vec::with_capacity(5);
        if !shape.short {
            nodes.push(zones.p(z));
        }
        nodes.extend([zones.sc(z), zones.cbd, zones.sc(j)]);
        if !shape.short {
            nodes.push(zones.p(j));
        }
        let stops = stops_for(&nodes, shape.express, Some(zones.cbd));
        routes.push(two_way(
            format!("{prefix}_{}_{z}_{j}", mode.name()),
            mode,
            nodes,
            stops,
        )?);
    }
    Ok(routes)
}

/// Routes along the subcenter ring from zone `z` to zone `z + zone_jump`.
pub fn tangential_routes(
    network: &TransitNetwork,
    mode: &Arc<TransportMode>,
    zone_jump: usize,
    shape: RouteShape,
) -> Result<Vec<Route>, NetworkError> {
    registered(network, mode)?;
    let zones = Zones::of(network)?;
    let n = zones.count();
    check_jump(zone_jump, n)?;
    let prefix = shape.prefix('T');

    (1..=n)
        .map(|z| {
            let j = (z - 1 + zone_jump) % n + 1;
            let mut nodes = Vec::with_capacity(zone_jump + 3);
            if !shape.short {
                nodes.push(zones.p(z));
            }
            nodes.extend((z..=z + zone_jump).map(|k| zones.sc(k)));
            if !shape.short {
                nodes.push(zones.p(j));
            }
            let stops = stops_for(&nodes, shape.express, None);
            two_way(format!("{prefix}_{}_{z}_{j}", mode.name()), mode, nodes, stops)
        })
        .collect()
}

/// Two loops around the subcenter ring, one per rotation.
///
/// Cities with fewer than three zones have no ring to loop around, and get
/// no circular routes.
pub fn circular_routes(
    network: &TransitNetwork,
    mode: &Arc<TransportMode>,
) -> Result<Vec<Route>, NetworkError> {
    registered(network, mode)?;
    let zones = Zones::of(network)?;
    let n = zones.count();
    if n < 3 {
        return Ok(Vec::new());
    }

    let clockwise: Vec<_> = (1..=n + 1).map(|z| zones.sc(z)).collect();
    let counter: Vec<_> = clockwise.iter().rev().copied().collect();

    [("C1", clockwise), ("C2", counter)]
        .into_iter()
        .map(|(tag, nodes)| {
            Route::new(
                format!("{tag}_{}", mode.name()),
                Arc::clone(mode),
                RouteType::Circular,
                Some(Itinerary::new(nodes.clone(), nodes)?),
                None,
            )
        })
        .collect()
}
