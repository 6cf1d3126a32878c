use std::sync::Arc;

use navigator_server::bridge::{BridgeService, TabuBridgeService};
use navigator_server::config::NavigatorConfig;
use navigator_server::data::load_graph;
use navigator_server::stops::StopIndex;
use navigator_server::web::{AppState, create_router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = NavigatorConfig::from_env().expect("Failed to load configuration");

    // Building the graph is CPU-bound and can take a while for a full city.
    let graph_config = config.graph.clone();
    let graph = tokio::task::spawn_blocking(move || load_graph(&graph_config))
        .await
        .expect("Graph loader panicked")
        .expect("Failed to load schedule");
    let graph = Arc::new(graph);

    let stops = StopIndex::from_graph(&graph, config.server.allowed_lexical_distance);
    let bridge = BridgeService::new(graph, config.bridge.clone());
    let tours = TabuBridgeService::new(bridge.clone(), config.tabu.clone());

    let addr = config.server.addr;
    let state = AppState::new(bridge, tours, stops, config.server);
    let app = create_router(state);

    info!(%addr, "transit navigator listening");
    info!("  GET  /health            - Health check");
    info!("  GET  /api/stops/search  - Search stop names");
    info!("  POST /api/route/plan    - Route between two stops");
    info!("  POST /api/tour/plan     - Optimise a circular tour");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
