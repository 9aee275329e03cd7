//! The line graph passengers choose paths over.
//!
//! Each city node contributes three nodes: an origin `Z` where trips
//! start, a stop `S` where a first vehicle is boarded, and a transfer node
//! `T` where passengers alight and either leave or board again. Each served
//! route direction ("line") contributes, for every stop, an arriving node
//! `A` and a departing node `D`. Riding moves from `D(i)` to `A(i + 1)`.
//!
//! Every cycle contains a ride link, and ride links have positive cost, so
//! labels computed per destination are well defined.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::city::{Graph, NodeId};
use crate::transit::{Direction, PassengerProfile, TransitNetwork};

/// The kind of node, in the order ties between equal labels are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Layer {
    Origin,
    Stop,
    Arrive,
    Transfer,
    Depart,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LinkKind {
    /// Walk from an origin to a stop
    Access { km: f64 },
    /// First boarding of a line
    Board { line: usize },
    /// Boarding after a previous ride
    Transfer { line: usize },
    /// Ride one stop segment of a line
    Ride { line: usize, segment: usize },
    /// Stay on board through a stop
    Stay,
    /// Get off at a stop
    Alight,
}

impl LinkKind {
    /// Kilometres walked along the link.
    pub fn walk_km(self) -> f64 {
        match self {
            LinkKind::Access { km } => km,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Link {
    pub tail: usize,
    pub head: usize,
    pub kind: LinkKind,
    /// Perceived cost ($)
    pub cost: f64,
    /// Dispersion of the choice this link takes part in
    pub theta: f64,
}

/// Leaving the network at, or walking from, a transfer node to the destination.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Exit {
    pub node: usize,
    pub km: f64,
    pub cost: f64,
}

/// One served direction of a route.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Line {
    /// Position of the route in the network
    pub route: usize,
    pub direction: Direction,
    pub stops: Vec<NodeId>,
    /// Track length between consecutive stops (km)
    pub segment_km: Vec<f64>,
    /// Running plus dwell time between consecutive stops (h)
    pub segment_hours: Vec<f64>,
    pub theta: f64,
    base: usize,
}

impl Line {
    fn arrive(&self, stop: usize) -> usize {
        self.base + stop
    }

    fn depart(&self, stop: usize) -> usize {
        self.base + self.stops.len() + stop
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LineGraph<'a> {
    graph: &'a Graph,
    zones: usize,
    lines: Vec<Line>,
    links: Vec<Link>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    layers: Vec<Layer>,
    frequencies: Vec<f64>,
    walk_theta: f64,
    spa: f64,
    va: f64,
    spw: f64,
    spt: f64,
}

impl<'a> LineGraph<'a> {
    /// Build the line graph of a validated network.
    ///
    /// Boarding links start unpriced; call [`LineGraph::reprice`] before
    /// computing labels.
    pub fn new(graph: &'a Graph, network: &TransitNetwork, passenger: &PassengerProfile) -> Self {
        let zones = graph.node_count();
        let mut layers = Vec::with_capacity(3 * zones);
        layers.extend(std::iter::repeat_n(Layer::Origin, zones));
        layers.extend(std::iter::repeat_n(Layer::Stop, zones));
        layers.extend(std::iter::repeat_n(Layer::Transfer, zones));

        let mut lines = Vec::new();
        for (route_idx, route) in network.routes().iter().enumerate() {
            let mode = route.mode();
            for (direction, itinerary) in route.directions() {
                let segment_km: Vec<f64> = itinerary
                    .stop_segments()
                    .map(|path| {
                        path.windows(2)
                            .map(|w| graph.edge_between(w[0], w[1]).map_or(0.0, |e| e.length))
                            .sum()
                    })
                    .collect();
                let segment_hours = segment_km
                    .iter()
                    .map(|&km| mode.running_hours(km) + mode.dwell_hours())
                    .collect();
                let stops = itinerary.stops().to_vec();

                let base = layers.len();
                layers.extend(std::iter::repeat_n(Layer::Arrive, stops.len()));
                layers.extend(std::iter::repeat_n(Layer::Depart, stops.len()));

                lines.push(Line {
                    route: route_idx,
                    direction,
                    stops,
                    segment_km,
                    segment_hours,
                    theta: mode.params().theta,
                    base,
                });
            }
        }

        let modes = network.modes();
        let walk_theta = if modes.is_empty() {
            0.0
        } else {
            modes.iter().map(|m| m.params().theta).sum::<f64>() / modes.len() as f64
        };

        let mut line_graph = Self {
            graph,
            zones,
            lines,
            links: Vec::new(),
            outgoing: vec![Vec::new(); layers.len()],
            incoming: vec![Vec::new(); layers.len()],
            layers,
            frequencies: vec![0.0; network.routes().len()],
            walk_theta,
            spa: passenger.spa,
            va: passenger.va,
            spw: passenger.spw,
            spt: passenger.spt,
        };
        line_graph.add_links(passenger);
        line_graph
    }

    fn add_links(&mut self, passenger: &PassengerProfile) {
        let graph = self.graph;
        for node in graph.nodes() {
            let n = node.id.0;
            self.push(self.origin(n), self.stop(n), LinkKind::Access { km: 0.0 }, 0.0, self.walk_theta);
            for (m, km) in graph.outgoing(node.id).map(|e| (e.to.0, e.length)) {
                let cost = self.walk_cost(km);
                self.push(self.origin(n), self.stop(m), LinkKind::Access { km }, cost, self.walk_theta);
            }
        }

        for line_idx in 0..self.lines.len() {
            let line = self.lines[line_idx].clone();
            let last = line.stops.len() - 1;
            for (i, stop) in line.stops.iter().enumerate() {
                let s = stop.0;
                if i < last {
                    self.push(self.stop(s), line.depart(i), LinkKind::Board { line: line_idx }, 0.0, line.theta);
                    self.push(self.transfer(s), line.depart(i), LinkKind::Transfer { line: line_idx }, 0.0, line.theta);
                    self.push(
                        line.depart(i),
                        line.arrive(i + 1),
                        LinkKind::Ride { line: line_idx, segment: i },
                        passenger.spv * line.segment_hours[i],
                        line.theta,
                    );
                }
                if i > 0 {
                    self.push(line.arrive(i), self.transfer(s), LinkKind::Alight, 0.0, line.theta);
                    if i < last {
                        self.push(line.arrive(i), line.depart(i), LinkKind::Stay, 0.0, line.theta);
                    }
                }
            }
        }
    }

    fn push(&mut self, tail: usize, head: usize, kind: LinkKind, cost: f64, theta: f64) {
        let idx = self.links.len();
        self.links.push(Link {
            tail,
            head,
            kind,
            cost,
            theta,
        });
        self.outgoing[tail].push(idx);
        self.incoming[head].push(idx);
    }

    /// Set route frequencies and update the waiting cost of boarding links.
    pub fn reprice(&mut self, frequencies: &[f64]) {
        self.frequencies = frequencies.to_vec();
        for link in &mut self.links {
            let line = match link.kind {
                LinkKind::Board { line } | LinkKind::Transfer { line } => line,
                _ => continue,
            };
            let frequency = self.frequencies[self.lines[line].route];
            let wait = self.spw / (2.0 * frequency);
            link.cost = match link.kind {
                LinkKind::Transfer { .. } => wait + self.spt,
                _ => wait,
            };
        }
    }

    fn walk_cost(&self, km: f64) -> f64 {
        self.spa * km / self.va
    }

    pub fn origin(&self, node: usize) -> usize {
        node
    }

    pub fn stop(&self, node: usize) -> usize {
        self.zones + node
    }

    pub fn transfer(&self, node: usize) -> usize {
        2 * self.zones + node
    }

    pub fn node_count(&self) -> usize {
        self.layers.len()
    }

    pub fn zones(&self) -> usize {
        self.zones
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn layer(&self, node: usize) -> Layer {
        self.layers[node]
    }

    /// Links leaving a node.
    pub fn outgoing(&self, node: usize) -> impl Iterator<Item = &Link> + '_ {
        self.outgoing[node].iter().map(|&l| &self.links[l])
    }

    /// Frequency of the route a line belongs to.
    pub fn line_frequency(&self, line: usize) -> f64 {
        self.frequencies[self.lines[line].route]
    }

    pub fn walk_theta(&self) -> f64 {
        self.walk_theta
    }

    /// Walking speed (km/h).
    pub fn walk_speed(&self) -> f64 {
        self.va
    }

    /// Ways of finishing a trip to `destination`: alighting there, or
    /// alighting next to it and walking the last link.
    pub fn exits(&self, destination: NodeId) -> Vec<Exit> {
        let mut exits = vec![Exit {
            node: self.transfer(destination.0),
            km: 0.0,
            cost: 0.0,
        }];
        exits.extend(self.graph.incoming(destination).map(|e| Exit {
            node: self.transfer(e.from.0),
            km: e.length,
            cost: self.walk_cost(e.length),
        }));
        exits
    }

    /// Least perceived cost from every node to the destination the exits lead to.
    ///
    /// Unreachable nodes are labelled with infinity.
    pub fn labels(&self, exits: &[Exit]) -> Vec<f64> {
        let mut labels = vec![f64::INFINITY; self.node_count()];
        let mut heap = BinaryHeap::new();

        for exit in exits {
            if exit.cost < labels[exit.node] {
                labels[exit.node] = exit.cost;
                heap.push(Reverse((Cost(exit.cost), exit.node)));
            }
        }

        while let Some(Reverse((Cost(cost), node))) = heap.pop() {
            if cost > labels[node] {
                continue;
            }
            for &l in &self.incoming[node] {
                let link = &self.links[l];
                let candidate = cost + link.cost;
                if candidate < labels[link.tail] {
                    labels[link.tail] = candidate;
                    heap.push(Reverse((Cost(candidate), link.tail)));
                }
            }
        }

        labels
    }
}

/// Total order on non-NaN costs for the heap.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::{Node, NodeKind};
    use crate::transit::{ModeParameters, Route, RouteType, TransportMode};
    use std::sync::Arc;

    /// CBD at the origin and one periphery 10 km east, linked both ways.
    fn corridor() -> Graph {
        let nodes = vec![
            Node::new(NodeId(0), "CBD", 0.0, 0.0, NodeKind::Center, 0),
            Node::new(NodeId(1), "P_1", 10.0, 0.0, NodeKind::Periphery, 1),
        ];
        Graph::new(nodes, &[(NodeId(1), NodeId(0)), (NodeId(0), NodeId(1))]).unwrap()
    }

    fn mode() -> TransportMode {
        let params = ModeParameters {
            bya: 0,
            v: 20.0,
            ..ModeParameters::bus()
        };
        TransportMode::new("bus", params).unwrap()
    }

    fn network(graph: &Graph) -> TransitNetwork {
        let mut net = TransitNetwork::new(Arc::new(graph.clone()));
        let bus = net.add_mode(mode()).unwrap();
        let route = Route::from_sequences("F", bus, RouteType::Custom, "1,0", "1,0", "0,1", "0,1").unwrap();
        net.add_route(route).unwrap();
        net
    }

    #[test]
    fn layout() {
        let graph = corridor();
        let net = network(&graph);
        let lg = LineGraph::new(&graph, &net, &PassengerProfile::default());

        // 3 layers of 2 city nodes, then 2 lines with 2 stops each (A and D)
        assert_eq!(lg.node_count(), 6 + 8);
        assert_eq!(lg.lines().len(), 2);
        assert_eq!(lg.lines()[0].direction, Direction::Outbound);
        assert_eq!(lg.lines()[0].segment_km, vec![10.0]);
        assert_eq!(lg.lines()[0].segment_hours, vec![0.5]);

        assert_eq!(lg.layer(lg.origin(1)), Layer::Origin);
        assert_eq!(lg.layer(lg.stop(1)), Layer::Stop);
        assert_eq!(lg.layer(lg.transfer(0)), Layer::Transfer);
        assert_eq!(lg.layer(6), Layer::Arrive);
        assert_eq!(lg.layer(8), Layer::Depart);
    }

    #[test]
    fn labels_price_wait_ride_and_walk() {
        let graph = corridor();
        let net = network(&graph);
        let passenger = PassengerProfile::default();
        let mut lg = LineGraph::new(&graph, &net, &passenger);
        lg.reprice(&[4.0]);

        let exits = lg.exits(NodeId(0));
        assert_eq!(exits.len(), 2);
        let labels = lg.labels(&exits);

        let wait = passenger.spw / 8.0;
        let ride = passenger.spv * 0.5;
        assert!((labels[lg.origin(1)] - (wait + ride)).abs() < 1e-12);
        assert_eq!(labels[lg.transfer(0)], 0.0);
        // From the periphery's transfer node, riding back beats walking
        let walk = passenger.spa * 10.0 / passenger.va;
        let reboard = wait + passenger.spt + ride;
        assert!((labels[lg.transfer(1)] - walk.min(reboard)).abs() < 1e-12);
        // The destination's own origin node never reaches a vehicle towards itself
        assert!(labels[lg.origin(0)] > labels[lg.origin(1)]);
    }

    #[test]
    fn reprice_updates_waiting() {
        let graph = corridor();
        let net = network(&graph);
        let passenger = PassengerProfile::default();
        let mut lg = LineGraph::new(&graph, &net, &passenger);

        lg.reprice(&[2.0]);
        let slow = lg.labels(&lg.exits(NodeId(0)))[lg.origin(1)];
        lg.reprice(&[20.0]);
        let fast = lg.labels(&lg.exits(NodeId(0)))[lg.origin(1)];

        assert!((slow - fast - passenger.spw * (0.25 - 0.025)).abs() < 1e-12);
        assert_eq!(lg.line_frequency(1), 20.0);
    }

    #[test]
    fn unreachable_without_routes() {
        let graph = corridor();
        let net = TransitNetwork::new(Arc::new(graph.clone()));
        let lg = LineGraph::new(&graph, &net, &PassengerProfile::default());
        let labels = lg.labels(&lg.exits(NodeId(0)));

        assert!(labels[lg.origin(1)].is_infinite());
        assert_eq!(lg.walk_theta(), 0.0);
    }
}
