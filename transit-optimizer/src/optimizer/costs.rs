//! Hourly cost components.

use std::collections::BTreeMap;

use super::assignment::Assignment;
use crate::city::{Graph, NodeId};
use crate::transit::{PassengerProfile, Route, TransportMode};

/// Hourly cost of operating a route: fixed, per vehicle and per vehicle-km.
pub(crate) fn operator_cost(mode: &TransportMode, frequency: f64, fleet: f64, length_km: f64) -> f64 {
    let params = mode.params();
    params.co + params.c1 * fleet + params.c2 * frequency * length_km
}

/// Hourly infrastructure cost of a mode.
///
/// The mode's fixed cost is charged per kilometre of distinct road links its
/// routes use, scaled by how close its busiest arc runs to the mode's
/// maximum frequency.
pub(crate) fn infrastructure_cost<'r>(
    graph: &Graph,
    mode: &TransportMode,
    routes: impl IntoIterator<Item = (&'r Route, f64)>,
) -> f64 {
    // Ordered so the length sum is the same on every run
    let mut arc_frequency: BTreeMap<(NodeId, NodeId), f64> = BTreeMap::new();
    let mut links: BTreeMap<(NodeId, NodeId), f64> = BTreeMap::new();

    for (route, frequency) in routes {
        for (_, itinerary) in route.directions() {
            for (from, to) in itinerary.links() {
                *arc_frequency.entry((from, to)).or_default() += frequency;
                let length = graph.edge_between(from, to).map_or(0.0, |e| e.length);
                links.insert((from.min(to), from.max(to)), length);
            }
        }
    }

    let peak = arc_frequency.values().copied().fold(0.0, f64::max);
    let length: f64 = links.values().sum();
    mode.params().co * length * peak / mode.params().fmax
}

/// Hourly cost of the passengers' time and transfers.
pub(crate) fn user_cost(passenger: &PassengerProfile, assignment: &Assignment) -> f64 {
    passenger.pv * assignment.in_vehicle_hours
        + passenger.pw * assignment.waiting_hours
        + passenger.pa * assignment.access_hours
        + passenger.pt * assignment.transfers
}
