//! Transit route-flow assignment and frequency optimization.
//!
//! Given a city graph, a trip demand matrix, passenger cost coefficients
//! and a set of routes, answers: "how often should each route run, how
//! many vehicles does that take, and what does the network cost?"

pub mod city;
pub mod optimizer;
pub mod runs;
pub mod scene;
pub mod transit;
