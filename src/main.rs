use anyhow::Context;

use propostas_api::{app, config::Config, cors_layer, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up IDENTITY_URL, TOKEN_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = Config::from_env().context("invalid configuration")?;
    let cors = cors_layer(config.cors_origin.as_deref()).context("invalid CORS_ORIGIN")?;
    let state = AppState::from_config(&config);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("propostas-api listening on http://{bind_addr}");

    axum::serve(listener, app(state, cors)).await?;
    Ok(())
}
