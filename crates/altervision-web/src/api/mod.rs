mod sales;
mod token;

use axum::http::{header, Method};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::dto::HealthResponse;
use crate::middleware::security_headers;
use crate::state::AppState;

pub fn token_router() -> Router<AppState> {
    Router::new().route("/token", post(token::issue_token))
}

/// Routes behind bearer auth and the per-client quota.
pub fn sales_router() -> Router<AppState> {
    Router::new().route("/vendas", get(sales::list_sales))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// The full application with shared layers applied.
pub fn app(state: AppState) -> Router {
    // CORS: same-origin only by default (no cross-origin requests allowed)
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        .merge(token_router())
        .merge(sales_router())
        .layer(from_fn(security_headers::security_headers))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
