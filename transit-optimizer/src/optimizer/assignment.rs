//! Stochastic loading of the demand matrix onto the line graph.
//!
//! For each destination, nodes are visited from the highest label down and
//! their flow is split over efficient links: those whose head is no further
//! from the destination and is visited later. Because heads are always
//! visited after their tails, one pass per destination loads every origin.

use tracing::{trace, warn};

use super::line_graph::{Exit, LineGraph, LinkKind};
use crate::city::{DemandMatrix, NodeId};

/// Loads and time totals of one assignment.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Assignment {
    /// Passengers on each stop segment, per line
    pub segment_loads: Vec<Vec<f64>>,
    /// Passengers boarding each line, first boardings and transfers
    pub boardings: Vec<f64>,
    /// Passenger-hours on board
    pub in_vehicle_hours: f64,
    /// Passenger-hours waiting
    pub waiting_hours: f64,
    /// Passenger-hours walking to the first stop and from the last
    pub access_hours: f64,
    /// Number of transfers made
    pub transfers: f64,
    pub assigned_trips: f64,
    pub unassigned_trips: f64,
    pub intrazonal_trips: f64,
}

impl Assignment {
    fn empty(graph: &LineGraph<'_>) -> Self {
        Self {
            segment_loads: graph
                .lines()
                .iter()
                .map(|line| vec![0.0; line.segment_km.len()])
                .collect(),
            boardings: vec![0.0; graph.lines().len()],
            ..Self::default()
        }
    }
}

/// A way out of a node during loading.
struct Choice {
    head: Option<usize>,
    kind: Option<LinkKind>,
    walk_km: f64,
    weight: f64,
}

/// Load every trip of `demand` onto the line graph at its current prices.
pub(crate) fn assign(graph: &LineGraph<'_>, demand: &DemandMatrix, dispersion_floor: f64) -> Assignment {
    let mut result = Assignment::empty(graph);

    for destination in 0..graph.zones() {
        let destination_id = NodeId(destination);
        let intrazonal = demand.get(destination_id, destination_id);
        result.intrazonal_trips += intrazonal;

        let trips: Vec<(usize, f64)> = (0..graph.zones())
            .filter(|&o| o != destination)
            .map(|o| (o, demand.get(NodeId(o), destination_id)))
            .filter(|&(_, q)| q > 0.0)
            .collect();
        if trips.is_empty() {
            continue;
        }

        let exits = graph.exits(destination_id);
        let labels = graph.labels(&exits);
        let mut flow = vec![0.0; graph.node_count()];

        for (origin, trips) in trips {
            let node = graph.origin(origin);
            if labels[node].is_finite() {
                flow[node] += trips;
                result.assigned_trips += trips;
            } else {
                trace!(origin, destination, trips, "No transit path");
                result.unassigned_trips += trips;
            }
        }

        load_destination(graph, &labels, &exits, &mut flow, dispersion_floor, &mut result);
    }

    result
}

fn load_destination(
    graph: &LineGraph<'_>,
    labels: &[f64],
    exits: &[Exit],
    flow: &mut [f64],
    dispersion_floor: f64,
    result: &mut Assignment,
) {
    let mut exit_of = vec![None; graph.node_count()];
    for exit in exits {
        exit_of[exit.node] = Some(exit);
    }

    let mut order: Vec<usize> = (0..graph.node_count())
        .filter(|&n| labels[n].is_finite())
        .collect();
    order.sort_by(|&a, &b| {
        labels[b]
            .total_cmp(&labels[a])
            .then(graph.layer(a).cmp(&graph.layer(b)))
            .then(a.cmp(&b))
    });
    let mut position = vec![usize::MAX; graph.node_count()];
    for (i, &node) in order.iter().enumerate() {
        position[node] = i;
    }
    let downstream = |node: usize, head: usize| {
        position[head] != usize::MAX && position[head] > position[node]
    };

    for &node in &order {
        let volume = flow[node];
        if volume <= 0.0 {
            continue;
        }
        let label = labels[node];
        let tie = 1e-9 * label.max(1.0);

        // Ties include positive costs lost to rounding, so the visit order
        // decides rather than the cost
        let mut choices: Vec<Choice> = graph
            .outgoing(node)
            .filter(|link| labels[link.head] <= label && downstream(node, link.head))
            .map(|link| {
                let excess = link.cost + labels[link.head] - label;
                Choice {
                    head: Some(link.head),
                    kind: Some(link.kind),
                    walk_km: link.kind.walk_km(),
                    weight: choice_weight(excess, link.theta * label, dispersion_floor, tie),
                }
            })
            .collect();

        if let Some(exit) = exit_of[node] {
            if label > 0.0 || exit.cost == 0.0 {
                let excess = exit.cost - label;
                choices.push(Choice {
                    head: None,
                    kind: None,
                    walk_km: exit.km,
                    weight: choice_weight(excess, graph.walk_theta() * label, dispersion_floor, tie),
                });
            }
        }

        if choices.is_empty() {
            // Cheapest way on, so no loaded trip is dropped
            let fallback = graph
                .outgoing(node)
                .filter(|link| downstream(node, link.head))
                .min_by(|a, b| {
                    (a.cost + labels[a.head]).total_cmp(&(b.cost + labels[b.head]))
                });
            if let Some(link) = fallback {
                choices.push(Choice {
                    head: Some(link.head),
                    kind: Some(link.kind),
                    walk_km: link.kind.walk_km(),
                    weight: 1.0,
                });
            } else if let Some(exit) = exit_of[node] {
                choices.push(Choice {
                    head: None,
                    kind: None,
                    walk_km: exit.km,
                    weight: 1.0,
                });
            } else {
                warn!(node, volume, label, "Flow stranded during loading");
                result.assigned_trips -= volume;
                result.unassigned_trips += volume;
                continue;
            }
        }
        let total: f64 = choices.iter().map(|c| c.weight).sum();
        let even = total <= 0.0;

        for choice in &choices {
            let share = if even {
                volume / choices.len() as f64
            } else {
                volume * choice.weight / total
            };
            if share <= 0.0 {
                continue;
            }
            if let Some(head) = choice.head {
                flow[head] += share;
            }
            result.access_hours += share * choice.walk_km / graph.walk_speed();
            match choice.kind {
                Some(LinkKind::Board { line }) => {
                    result.boardings[line] += share;
                    result.waiting_hours += share / (2.0 * graph.line_frequency(line));
                }
                Some(LinkKind::Transfer { line }) => {
                    result.boardings[line] += share;
                    result.waiting_hours += share / (2.0 * graph.line_frequency(line));
                    result.transfers += share;
                }
                Some(LinkKind::Ride { line, segment }) => {
                    result.segment_loads[line][segment] += share;
                    result.in_vehicle_hours += share * graph.lines()[line].segment_hours[segment];
                }
                _ => {}
            }
        }
    }
}

/// Logit weight of a link with the given excess cost.
///
/// Below the dispersion floor only links on a shortest path get weight.
fn choice_weight(excess: f64, scale: f64, dispersion_floor: f64, tie: f64) -> f64 {
    let excess = excess.max(0.0);
    if scale < dispersion_floor || scale <= 0.0 {
        if excess <= tie { 1.0 } else { 0.0 }
    } else {
        (-excess / scale).exp()
    }
}
