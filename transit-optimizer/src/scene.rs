//! Scene documents: the JSON description of one optimization run.
//!
//! A scene names a city (by structural parameters or Pajek text), its
//! demand (an explicit matrix or gravity parameters), the passenger
//! profile, the transport modes, and the routes. Routes are listed
//! explicitly, generated from the standard templates, or both.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::city::{CityError, DemandMatrix, DemandParameters, Graph, GraphParameters};
use crate::optimizer::TargetFrequencies;
use crate::transit::{
    ModeParameters, NetworkError, PassengerProfile, Route, RouteShape, RouteType, TransitNetwork,
    TransportMode, generators,
};

/// Errors from loading a scene document.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// The file could not be read
    #[error("failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    /// The document is not valid scene JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// The city or demand could not be built
    #[error(transparent)]
    City(#[from] CityError),

    /// A mode or route is invalid
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// A route names a mode the scene does not define
    #[error("route {route} uses undefined mode {mode}")]
    UndefinedMode { route: String, mode: String },

    /// A route type code is not 1, 2 or 3
    #[error("route {route} has unknown type code {code}")]
    UnknownRouteType { route: String, code: u8 },
}

/// Where the city graph comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CityDocument {
    Parameters(GraphParameters),
    Pajek { text: String },
}

/// Where the demand matrix comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DemandDocument {
    /// Trips per hour, one row per origin in node order
    Matrix { rows: Vec<Vec<f64>> },
    Parameters(DemandParameters),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModeDocument {
    pub name: String,
    #[serde(flatten)]
    pub params: ModeParameters,
}

/// A route given by comma-separated node and stop sequences.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteDocument {
    pub name: String,
    pub mode: String,
    /// 1 custom, 2 predefined, 3 circular
    #[serde(rename = "type", default = "custom_route")]
    pub route_type: u8,
    pub nodes_outbound: String,
    pub stops_outbound: String,
    #[serde(default)]
    pub nodes_inbound: String,
    #[serde(default)]
    pub stops_inbound: String,
}

fn custom_route() -> u8 {
    RouteType::Custom.code()
}

/// A family of template routes for one mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum GeneratorDocument {
    Feeder {
        mode: String,
    },
    Radial {
        mode: String,
        #[serde(flatten)]
        shape: RouteShape,
    },
    Diametral {
        mode: String,
        zone_jump: usize,
        #[serde(flatten)]
        shape: RouteShape,
    },
    Tangential {
        mode: String,
        zone_jump: usize,
        #[serde(flatten)]
        shape: RouteShape,
    },
    Circular {
        mode: String,
    },
}

impl GeneratorDocument {
    fn name(&self) -> &'static str {
        match self {
            GeneratorDocument::Feeder { .. } => "feeder",
            GeneratorDocument::Radial { .. } => "radial",
            GeneratorDocument::Diametral { .. } => "diametral",
            GeneratorDocument::Tangential { .. } => "tangential",
            GeneratorDocument::Circular { .. } => "circular",
        }
    }

    fn mode(&self) -> &str {
        match self {
            GeneratorDocument::Feeder { mode }
            | GeneratorDocument::Radial { mode, .. }
            | GeneratorDocument::Diametral { mode, .. }
            | GeneratorDocument::Tangential { mode, .. }
            | GeneratorDocument::Circular { mode } => mode,
        }
    }
}

/// The serialized form of a scene.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneDocument {
    pub name: String,
    pub city: CityDocument,
    pub demand: DemandDocument,
    #[serde(default)]
    pub passenger: PassengerProfile,
    pub modes: Vec<ModeDocument>,
    #[serde(default)]
    pub routes: Vec<RouteDocument>,
    #[serde(default)]
    pub generate: Vec<GeneratorDocument>,
    /// Fixed frequencies by route name
    #[serde(default)]
    pub targets: TargetFrequencies,
}

/// Validated inputs of one optimization run.
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    pub graph: Arc<Graph>,
    pub demand: DemandMatrix,
    pub passenger: PassengerProfile,
    pub network: TransitNetwork,
    pub targets: TargetFrequencies,
}

impl SceneDocument {
    /// Parse a scene from JSON text.
    pub fn parse(json: &str) -> Result<Self, SceneError> {
        serde_json::from_str(json).map_err(|e| SceneError::Json {
            message: e.to_string(),
        })
    }

    /// Build the graph, demand and network the document describes.
    ///
    /// Explicit routes are added before generated ones. Target frequencies
    /// are checked against the network when the scene is optimized.
    pub fn build(self) -> Result<Scene, SceneError> {
        let graph = Arc::new(match &self.city {
            CityDocument::Parameters(params) => Graph::build_from_parameters(params)?,
            CityDocument::Pajek { text } => Graph::build_from_pajek(text)?,
        });
        let demand = match self.demand {
            DemandDocument::Matrix { rows } => DemandMatrix::build_from_content(&graph, rows)?,
            DemandDocument::Parameters(params) => {
                DemandMatrix::build_from_parameters(&graph, &params)?
            }
        };

        let mut network = TransitNetwork::new(Arc::clone(&graph));
        for mode in self.modes {
            network.add_mode(TransportMode::new(mode.name, mode.params)?)?;
        }

        for route in self.routes {
            let mode = network
                .mode(&route.mode)
                .cloned()
                .ok_or_else(|| SceneError::UndefinedMode {
                    route: route.name.clone(),
                    mode: route.mode.clone(),
                })?;
            let route_type =
                RouteType::from_code(route.route_type).ok_or_else(|| SceneError::UnknownRouteType {
                    route: route.name.clone(),
                    code: route.route_type,
                })?;
            network.add_route(Route::from_sequences(
                route.name,
                mode,
                route_type,
                &route.nodes_outbound,
                &route.stops_outbound,
                &route.nodes_inbound,
                &route.stops_inbound,
            )?)?;
        }

        for template in &self.generate {
            let mode = network
                .mode(template.mode())
                .cloned()
                .ok_or_else(|| SceneError::UndefinedMode {
                    route: format!("{} template", template.name()),
                    mode: template.mode().to_string(),
                })?;
            let routes = match template {
                GeneratorDocument::Feeder { .. } => generators::feeder_routes(&network, &mode)?,
                GeneratorDocument::Radial { shape, .. } => {
                    generators::radial_routes(&network, &mode, *shape)?
                }
                GeneratorDocument::Diametral {
                    zone_jump, shape, ..
                } => generators::diametral_routes(&network, &mode, *zone_jump, *shape)?,
                GeneratorDocument::Tangential {
                    zone_jump, shape, ..
                } => generators::tangential_routes(&network, &mode, *zone_jump, *shape)?,
                GeneratorDocument::Circular { .. } => generators::circular_routes(&network, &mode)?,
            };
            network.add_routes(routes)?;
        }

        debug!(
            scene = %self.name,
            nodes = graph.node_count(),
            modes = network.modes().len(),
            routes = network.routes().len(),
            "Scene built"
        );

        Ok(Scene {
            name: self.name,
            graph,
            demand,
            passenger: self.passenger,
            network,
            targets: self.targets,
        })
    }
}

/// Read and build a scene file.
pub fn load(path: &Path) -> Result<Scene, SceneError> {
    let json = std::fs::read_to_string(path).map_err(|e| SceneError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    SceneDocument::parse(&json)?.build()
}
