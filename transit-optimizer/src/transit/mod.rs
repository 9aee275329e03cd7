//! Transit supply and passenger behaviour: modes, routes and the network
//! they form over a city graph.

mod error;
pub mod generators;
mod mode;
mod network;
mod passenger;
mod route;

pub use error::NetworkError;
pub use generators::RouteShape;
pub use mode::{ModeParameters, TransportMode};
pub use network::TransitNetwork;
pub use passenger::PassengerProfile;
pub use route::{Direction, Itinerary, Route, RouteType};
