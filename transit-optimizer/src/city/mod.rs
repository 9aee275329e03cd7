//! City model: zones, the directed graph linking them, and travel demand.
//!
//! These are immutable value inputs to an optimization run. Builders
//! validate their parameters up front, so a `Graph` or `DemandMatrix`
//! that exists is always internally consistent.

mod demand;
mod error;
mod graph;
mod node;
mod pajek;

pub use demand::{DemandMatrix, DemandParameters};
pub use error::CityError;
pub use graph::{
    Edge, EdgeDescriptor, EdgeId, Graph, GraphDescriptor, GraphParameters, MAX_ZONES,
    NodeDescriptor,
};
pub use node::{Node, NodeId, NodeKind};
