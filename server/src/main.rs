use std::net::SocketAddr;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ivana_server::config::Config;
use ivana_server::repository::open_store;
use ivana_server::routes::create_routes;
use ivana_server::services::calendar::WindowResolver;
use ivana_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();
    tracing::info!(
        store = %config.store_backend,
        window_policy = %config.window_policy,
        "Configuration loaded"
    );

    let store = open_store(&config).await?;
    let state = AppState::new(store.clone(), WindowResolver::new(config.window_policy));
    let app = create_routes(state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server running at http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    store.close().await;

    if let Err(e) = &served {
        tracing::error!(error.message = %e, "Server failed");
    }
    served.map_err(Into::into)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error.message = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
