//! Route geometry, cycle times and frequency design.

use super::assignment::Assignment;
use super::line_graph::Line;
use crate::transit::{PassengerProfile, TransportMode};

/// Fixed quantities of a route that do not depend on its frequency.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteGeometry {
    /// Track length over every served direction (km)
    pub length_km: f64,
    /// Time for one vehicle to serve every direction and turn around (h)
    pub cycle_hours: f64,
    /// Indices of the route's lines in the line graph
    pub lines: Vec<usize>,
}

impl RouteGeometry {
    /// Geometry of every route, in network order.
    pub fn of_routes(lines: &[Line], modes: &[&TransportMode]) -> Vec<Self> {
        let mut geometry: Vec<Self> = modes
            .iter()
            .map(|_| Self {
                length_km: 0.0,
                cycle_hours: 0.0,
                lines: Vec::new(),
            })
            .collect();

        for (idx, line) in lines.iter().enumerate() {
            let route = &mut geometry[line.route];
            route.length_km += line.segment_km.iter().sum::<f64>();
            route.cycle_hours += line.segment_hours.iter().sum::<f64>()
                + modes[line.route].turnaround_hours();
            route.lines.push(idx);
        }
        geometry
    }
}

/// Loads of one route under an assignment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteLoad {
    /// Highest stop-to-stop load over both directions
    pub peak: f64,
    /// Lowest stop-to-stop load over both directions
    pub least: f64,
    pub boardings: f64,
}

impl RouteLoad {
    pub fn new(geometry: &RouteGeometry, assignment: &Assignment) -> Self {
        let mut peak: f64 = 0.0;
        let mut least = f64::INFINITY;
        let mut boardings = 0.0;

        for &idx in &geometry.lines {
            let loads = &assignment.segment_loads[idx];
            for &load in loads {
                peak = peak.max(load);
                least = least.min(load);
            }
            boardings += assignment.boardings[idx];
        }

        Self {
            peak,
            least: if least.is_finite() { least } else { 0.0 },
            boardings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.peak <= 0.0 && self.boardings <= 0.0
    }
}

/// Frequency a route should run at for its load.
///
/// Enough vehicles to carry the peak load, and no fewer than the square-root
/// rule balancing waiting cost against operating cost, within the mode's
/// bounds. A target replaces the derived value but is still bounded.
pub(crate) fn design_frequency(
    mode: &TransportMode,
    passenger: &PassengerProfile,
    geometry: &RouteGeometry,
    load: &RouteLoad,
    target: Option<f64>,
) -> f64 {
    let params = mode.params();
    let bounded = |f: f64| f.clamp(params.fini, params.fmax);

    if let Some(target) = target {
        return bounded(target);
    }
    if load.is_empty() {
        return params.fini;
    }

    let capacity = load.peak / params.kmax;
    let denominator = params.c1 * geometry.cycle_hours / params.d + params.c2 * geometry.length_km;
    let square_root = if denominator > 0.0 {
        (passenger.pw * load.boardings / 2.0 / denominator).sqrt()
    } else {
        0.0
    };
    bounded(capacity.max(square_root))
}

/// Vehicles needed to run a route at a frequency.
pub(crate) fn fleet(mode: &TransportMode, geometry: &RouteGeometry, frequency: f64) -> f64 {
    frequency * geometry.cycle_hours / mode.params().d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transit::ModeParameters;

    fn mode(params: ModeParameters) -> TransportMode {
        TransportMode::new("bus", params).unwrap()
    }

    fn geometry(length_km: f64, cycle_hours: f64) -> RouteGeometry {
        RouteGeometry {
            length_km,
            cycle_hours,
            lines: vec![0, 1],
        }
    }

    fn load(peak: f64, boardings: f64) -> RouteLoad {
        RouteLoad {
            peak,
            least: 0.0,
            boardings,
        }
    }

    #[test]
    fn idle_routes_run_at_minimum() {
        let bus = mode(ModeParameters::bus());
        let f = design_frequency(&bus, &PassengerProfile::default(), &geometry(20.0, 1.0), &load(0.0, 0.0), None);
        assert_eq!(f, bus.params().fini);
    }

    #[test]
    fn capacity_sets_the_floor() {
        let bus = mode(ModeParameters {
            kmax: 100.0,
            c1: 1e6,
            ..ModeParameters::bus()
        });
        let f = design_frequency(&bus, &PassengerProfile::default(), &geometry(20.0, 1.0), &load(1000.0, 1000.0), None);
        assert!((f - 10.0).abs() < 1e-12);
    }

    #[test]
    fn square_root_rule() {
        let bus = mode(ModeParameters {
            kmax: 1e6,
            c1: 5.0,
            c2: 0.25,
            d: 1.0,
            ..ModeParameters::bus()
        });
        let passenger = PassengerProfile {
            pw: 5.0,
            ..PassengerProfile::default()
        };
        // sqrt(5 * 400 / 2 / (5 * 1 + 0.25 * 20)) = 10
        let f = design_frequency(&bus, &passenger, &geometry(20.0, 1.0), &load(400.0, 400.0), None);
        assert!((f - 10.0).abs() < 1e-12);
    }

    #[test]
    fn zero_length_route_falls_back_to_capacity() {
        let bus = mode(ModeParameters {
            kmax: 100.0,
            ..ModeParameters::bus()
        });
        let f = design_frequency(&bus, &PassengerProfile::default(), &geometry(0.0, 0.0), &load(500.0, 500.0), None);
        assert!((f - 5.0).abs() < 1e-12);
    }

    #[test]
    fn bounded_by_mode() {
        let bus = mode(ModeParameters {
            kmax: 10.0,
            fmax: 30.0,
            ..ModeParameters::bus()
        });
        let passenger = PassengerProfile::default();
        let g = geometry(20.0, 1.0);

        assert_eq!(design_frequency(&bus, &passenger, &g, &load(1e6, 1e6), None), 30.0);
        assert_eq!(design_frequency(&bus, &passenger, &g, &load(0.0, 0.0), Some(100.0)), 30.0);
        assert_eq!(design_frequency(&bus, &passenger, &g, &load(1e6, 1e6), Some(0.1)), bus.params().fini);
        assert_eq!(design_frequency(&bus, &passenger, &g, &load(0.0, 0.0), Some(12.0)), 12.0);
    }

    #[test]
    fn fleet_size() {
        let bus = mode(ModeParameters {
            d: 2.0,
            ..ModeParameters::bus()
        });
        assert!((fleet(&bus, &geometry(20.0, 1.5), 10.0) - 7.5).abs() < 1e-12);
    }
}
