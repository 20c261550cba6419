use log::{error, info, warn};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::{self, Filter};

use roomcast::config::ServerConfig;
use roomcast::constants::WS_PATH;
use roomcast::core::NamespaceServer;
use roomcast::handlers::websocket::handle_ws_client;

#[tokio::main]
async fn main() {
    // Initialize env
    if let Err(e) = dotenvy::dotenv() {
        // Logging is not up yet
        eprintln!("No .env file loaded: {}", e);
    }

    // Initialize logging
    env_logger::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, namespace={}",
        config.host, config.port, config.namespace
    );

    if !config.join_own_room {
        warn!("Private rooms disabled, clients cannot be addressed individually");
    }

    let server = Arc::new(NamespaceServer::new(&config));

    // Create WebSocket route
    let ws_route = warp::path(WS_PATH)
        .and(warp::ws())
        .and(with_server(server.clone()))
        .map(|ws: warp::ws::Ws, server: Arc<NamespaceServer>| {
            info!("New websocket connection");
            ws.on_upgrade(move |socket| handle_ws_client(socket, server))
        });

    // Create health check route
    let health_route = warp::path("health").map(|| "OK");

    // Combine routes
    let routes = ws_route.or(health_route);

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting roomcast server on {}", addr);
    warp::serve(routes).run(addr).await;
}

// Helper function to include the namespace server in request
fn with_server(
    server: Arc<NamespaceServer>,
) -> impl Filter<Extract = (Arc<NamespaceServer>,), Error = Infallible> + Clone {
    warp::any().map(move || server.clone())
}
