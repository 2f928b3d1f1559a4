mod config;
mod error;
mod routes;

use config::AppConfig;
use routes::{app_router, AppState};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("ebb_api=info".parse::<Directive>()?),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting ebb-api with config: {:?}", config);

    let router = app_router(AppState::default());
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("ebb-api listening on {}", config.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
