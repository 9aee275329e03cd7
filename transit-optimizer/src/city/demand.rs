//! Origin-destination travel demand.

use serde::{Deserialize, Serialize};

use super::error::parse_float;
use super::{CityError, Graph, NodeId, NodeKind};

/// Trips per hour between every pair of zones, indexed by node id.
///
/// # Invariants
///
/// - The matrix is square, sized to its graph's node count
/// - Every entry is finite and non-negative
#[derive(Debug, Clone, PartialEq)]
pub struct DemandMatrix {
    size: usize,
    trips: Vec<f64>,
}

impl DemandMatrix {
    /// An all-zero matrix for a graph.
    pub fn zeros(graph: &Graph) -> Self {
        let size = graph.node_count();
        Self {
            size,
            trips: vec![0.0; size * size],
        }
    }

    /// Build a matrix from explicit rows.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_optimizer::city::{DemandMatrix, Graph, GraphParameters, NodeId};
    ///
    /// let graph = Graph::build_from_parameters(&GraphParameters::new(1, 10.0, 0.5, 0.0)).unwrap();
    /// let rows = vec![vec![0.0, 0.0, 0.0], vec![8.0, 0.0, 2.0], vec![5.0, 0.0, 0.0]];
    /// let demand = DemandMatrix::build_from_content(&graph, rows).unwrap();
    ///
    /// assert_eq!(demand.get(NodeId(1), NodeId(0)), 8.0);
    /// assert_eq!(demand.total(), 15.0);
    ///
    /// // Rows must match the graph size
    /// assert!(DemandMatrix::build_from_content(&graph, vec![vec![0.0]]).is_err());
    /// ```
    pub fn build_from_content(graph: &Graph, rows: Vec<Vec<f64>>) -> Result<Self, CityError> {
        let size = graph.node_count();
        if rows.len() != size {
            return Err(CityError::Validation(format!(
                "demand matrix has {} rows but the graph has {size} nodes",
                rows.len()
            )));
        }

        let mut trips = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(CityError::Validation(format!(
                    "demand matrix row {i} has {} entries, expected {size}",
                    row.len()
                )));
            }
            if row.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(CityError::Validation(format!(
                    "demand matrix row {i} has a negative or non-finite entry"
                )));
            }
            trips.extend(row);
        }

        Ok(Self { size, trips })
    }

    /// Build a matrix from the trip generation and distribution parameters.
    pub fn build_from_parameters(
        graph: &Graph,
        params: &DemandParameters,
    ) -> Result<Self, CityError> {
        params.validate()?;

        let mut matrix = Self::zeros(graph);
        let Some(cbd) = graph.center().map(|c| c.id) else {
            return Ok(matrix);
        };

        let peripheries: Vec<_> = graph
            .nodes()
            .iter()
            .filter(|n| n.kind == NodeKind::Periphery)
            .collect();
        let subcenters: Vec<_> = graph
            .nodes()
            .iter()
            .filter(|n| n.kind == NodeKind::Subcenter)
            .collect();

        let periphery_shares = weight_shares(peripheries.iter().map(|n| n.weight));
        let subcenter_shares = weight_shares(subcenters.iter().map(|n| n.weight));

        for (node, share) in peripheries.iter().zip(periphery_shares) {
            let generated = params.y * params.a * share;
            let own = subcenters.iter().find(|sc| sc.zone == node.zone).map(|sc| sc.id);
            let others: Vec<NodeId> = subcenters
                .iter()
                .filter(|sc| sc.zone != node.zone)
                .map(|sc| sc.id)
                .collect();

            matrix.add(node.id, cbd, generated * params.alpha);
            let remaining = generated * (1.0 - params.alpha);
            let spread = match (own, others.is_empty()) {
                (Some(own), true) => {
                    matrix.add(node.id, own, remaining);
                    0.0
                }
                (Some(own), false) => {
                    matrix.add(node.id, own, generated * params.beta);
                    (remaining - generated * params.beta).max(0.0)
                }
                (None, true) => {
                    matrix.add(node.id, cbd, remaining);
                    0.0
                }
                (None, false) => remaining,
            };
            for &other in &others {
                matrix.add(node.id, other, spread / others.len() as f64);
            }
        }

        for (node, share) in subcenters.iter().zip(subcenter_shares) {
            let generated = params.y * (1.0 - params.a) * share;
            let others: Vec<NodeId> = subcenters
                .iter()
                .filter(|sc| sc.id != node.id)
                .map(|sc| sc.id)
                .collect();

            if others.is_empty() {
                matrix.add(node.id, cbd, generated);
                continue;
            }
            matrix.add(node.id, cbd, generated * params.alpha);
            let rest = generated * (1.0 - params.alpha);
            for &other in &others {
                matrix.add(node.id, other, rest / others.len() as f64);
            }
        }

        Ok(matrix)
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Trips per hour from `origin` to `destination`; 0 when out of range.
    pub fn get(&self, origin: NodeId, destination: NodeId) -> f64 {
        if origin.0 >= self.size || destination.0 >= self.size {
            return 0.0;
        }
        self.trips[origin.0 * self.size + destination.0]
    }

    /// Total trips per hour.
    pub fn total(&self) -> f64 {
        self.trips.iter().sum()
    }

    /// Matrix rows, for serialization.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.trips.chunks(self.size).map(<[f64]>::to_vec).collect()
    }

    /// All `(origin, destination, trips)` entries with positive demand.
    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        self.trips
            .iter()
            .enumerate()
            .filter(|(_, trips)| **trips > 0.0)
            .map(|(idx, trips)| (NodeId(idx / self.size), NodeId(idx % self.size), *trips))
    }

    fn add(&mut self, origin: NodeId, destination: NodeId, trips: f64) {
        self.trips[origin.0 * self.size + destination.0] += trips;
    }
}

/// Parameters of the trip generation and distribution model.
///
/// `y` trips per hour are generated in total: a share `a` in peripheries
/// and the rest in subcenters, split over zones by node weight. Periphery
/// trips go to the CBD (`alpha`), to their own subcenter (`beta`) and evenly
/// to the other subcenters. Subcenter trips go to the CBD (`alpha`) and
/// evenly to the other subcenters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandParameters {
    pub y: f64,
    pub a: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl DemandParameters {
    pub fn new(y: f64, a: f64, alpha: f64, beta: f64) -> Self {
        Self { y, a, alpha, beta }
    }

    /// Parse parameters from text fields.
    pub fn parse(y: &str, a: &str, alpha: &str, beta: &str) -> Result<Self, CityError> {
        let params = Self::new(
            parse_float("y", y)?,
            parse_float("a", a)?,
            parse_float("alpha", alpha)?,
            parse_float("beta", beta)?,
        );
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<(), CityError> {
        if !self.y.is_finite() || self.y < 0.0 {
            return Err(CityError::Validation("y must be positive".to_string()));
        }
        for (field, value) in [("a", self.a), ("alpha", self.alpha), ("beta", self.beta)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CityError::Validation(format!(
                    "{field} must be between 0 and 1"
                )));
            }
        }
        if self.alpha + self.beta > 1.0 {
            return Err(CityError::Validation(
                "alpha + beta must not exceed 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Normalise weights to shares summing to 1; equal shares when all are zero.
fn weight_shares(weights: impl Iterator<Item = f64>) -> Vec<f64> {
    let weights: Vec<f64> = weights.collect();
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter().map(|w| w / total).collect()
    } else {
        let even = 1.0 / weights.len().max(1) as f64;
        vec![even; weights.len()]
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::city::GraphParameters;
    use proptest::prelude::*;

    proptest! {
        /// Parameter-built matrices are always sized to the graph
        #[test]
        fn parameter_matrix_matches_zone_count(
            n in 0i64..30,
            y in 0.0f64..10_000.0,
            a in 0.0f64..=1.0,
            alpha in 0.0f64..=0.5,
            beta in 0.0f64..=0.5,
        ) {
            let graph = Graph::build_from_parameters(&GraphParameters::new(n, 5.0, 1.0, 0.0)).unwrap();
            let demand = DemandMatrix::build_from_parameters(
                &graph,
                &DemandParameters::new(y, a, alpha, beta),
            ).unwrap();

            prop_assert_eq!(demand.size(), graph.node_count());
            prop_assert_eq!(demand.rows().len(), graph.node_count());
            if n > 0 {
                prop_assert!((demand.total() - y).abs() < 1e-6 * y.max(1.0));
            }
        }

        /// Content of the wrong size is always rejected
        #[test]
        fn wrong_size_content_rejected(n in 1i64..10, delta in 1usize..3) {
            let graph = Graph::build_from_parameters(&GraphParameters::new(n, 5.0, 1.0, 0.0)).unwrap();
            let size = graph.node_count() + delta;
            prop_assert!(DemandMatrix::build_from_content(&graph, vec![vec![0.0; size]; size]).is_err());
        }
    }
}
