use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use crate::dto::{TokenQuery, TokenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Issues a bearer token for `username`. No password is checked; callers
/// are trusted to sit behind the network boundary that fronts this API.
pub async fn issue_token(
    State(state): State<AppState>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Query(TokenQuery { username }) =
        query.map_err(|e| AppError::Validation(e.body_text()))?;

    let credential = state.tokens.issue(&username)?;
    tracing::info!(
        subject = %credential.subject,
        expires_at = %credential.expires_at,
        "Issued access token"
    );

    Ok(Json(TokenResponse {
        access_token: credential.token,
        token_type: "bearer",
    }))
}
