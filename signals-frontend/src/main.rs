use dotenvy::dotenv;
use signals_frontend::config::get_configuration;
use signals_frontend::startup::build_router;
use signals_frontend::telemetry::init_tracing;
use signals_frontend::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing("signals-frontend", &configuration.telemetry)?;

    signals_frontend::services::metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to register metrics: {}", e))?;

    let state = AppState::new(&configuration)
        .map_err(|e| anyhow::anyhow!("Failed to build application state: {}", e))?;

    info!(
        environment = ?configuration.environment,
        api_url = %state.auth_client.base_url(),
        secure_cookies = configuration.secure_cookies(),
        "Signals API client configured"
    );

    let app = build_router(state);

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting signals-frontend on {}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            anyhow::anyhow!("Server error: {}", e)
        })?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
