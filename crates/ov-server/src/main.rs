//! Entry point: load config, bootstrap application state, serve HTTP.

use ov_core::config::{load_openviking_config, validate_config};
use ov_server::{app_with_state, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_openviking_config(std::env::args().nth(1).as_deref())?;
    validate_config(&config)?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_level))
        .init();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let host = config.server.host.clone();
    let port = config.server.port;

    let state = AppState::bootstrap(config).await?;
    let app = app_with_state(state);

    tracing::info!(%host, port, "starting openviking server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
