use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use altervision_core::{SalesAggregate, SalesFilter};

use crate::auth::middleware::AuthUser;
use crate::dto::SalesQuery;
use crate::error::AppError;
use crate::middleware::rate_limit::ClientAddr;
use crate::state::AppState;

/// `GET /vendas`: hourly per-seller sales totals for one company.
///
/// The credential is checked first and the query string second; only a
/// request that passes both counts against the caller's quota.
pub async fn list_sales(
    user: AuthUser,
    ClientAddr(client): ClientAddr,
    State(state): State<AppState>,
    query: Result<Query<SalesQuery>, QueryRejection>,
) -> Result<Json<Vec<SalesAggregate>>, AppError> {
    let Query(params) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    state.rate_limiter.enforce(client)?;
    let filter = SalesFilter::new(params.cnpj, params.data_inicio, params.data_fim)?;

    tracing::debug!(
        subject = %user.sub,
        cnpj = filter.cnpj(),
        start = %filter.start(),
        end = %filter.end(),
        "Querying sales"
    );

    let rows = state.sales.aggregate_sales(&filter).await?;
    Ok(Json(rows))
}
