use std::sync::Arc;

use axum::routing::get;
use bothost_agent::{config::Config, routes, state::AppState};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bothost_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        model = %config.model.name,
        backend = %config.backend_url,
        "configuration loaded"
    );

    let state = Arc::new(AppState::new(&config));

    let app = routes::create_router()
        .route("/", get(|| async { "BotHost SRE agent is running" }))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("SRE agent listening on http://{}", config.bind_addr());
    axum::serve(listener, app).await?;

    Ok(())
}
