use std::sync::Arc;

use alfafin_server::config::Config;
use alfafin_server::routes::app_router;
use alfafin_server::telemetry::{get_subscriber, init_subscriber};
use alfafin_server::{build_state, spawn_rates_refresh};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let subscriber = get_subscriber("alfafin".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let state = build_state(&config)?;
    tracing::info!(
        timezone = %state.builder.timezone(),
        templates = state.builder.templates().len(),
        admin = config.admin.as_deref().unwrap_or("-"),
        "Starting"
    );

    let rates = Arc::clone(state.builder.converter().rates());
    spawn_rates_refresh(rates, config.rates_refresh());

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!("Listening on {}", config.listen_addr);
    axum::serve(listener, app_router(state)).await?;
    Ok(())
}
