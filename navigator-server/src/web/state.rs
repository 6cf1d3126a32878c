//! Application state for the web layer.

use std::sync::Arc;

use crate::bridge::{BridgeService, TabuBridgeService};
use crate::config::ServerConfig;
use crate::stops::StopIndex;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Point-to-point routing over the loaded graph
    pub bridge: BridgeService,

    /// Tour optimiser; its leg and tour caches are shared by all requests
    pub tours: Arc<TabuBridgeService>,

    /// Stop names for resolving user input
    pub stops: Arc<StopIndex>,

    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        bridge: BridgeService,
        tours: TabuBridgeService,
        stops: StopIndex,
        config: ServerConfig,
    ) -> Self {
        Self {
            bridge,
            tours: Arc::new(tours),
            stops: Arc::new(stops),
            config: Arc::new(config),
        }
    }
}
