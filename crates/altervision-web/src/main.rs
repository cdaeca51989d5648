use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use altervision_core::MySqlSalesRepository;
use altervision_web::config::ServerConfig;
use altervision_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "altervision_web=debug,altervision_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;
    tracing::info!(
        "Token lifetime {} min, quota {} req/min per client",
        config.auth.access_token_expire_minutes,
        config.rate_limit.requests_per_minute
    );

    // Connections are opened on first query
    let repository = MySqlSalesRepository::connect_lazy(
        config.database.connect_options()?,
        config.database.max_connections,
    );

    let state = AppState::new(config, Arc::new(repository))?;

    // Forget clients whose quota has fully replenished
    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            limiter.retain_recent();
            tracing::debug!("Rate limiter tracking {} clients", limiter.len());
        }
    });

    let app = altervision_web::api::app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("altervision-web listening on http://{}", bind_addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
