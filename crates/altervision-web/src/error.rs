use axum::http::header::{HeaderValue, RETRY_AFTER, WWW_AUTHENTICATE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use altervision_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    Auth(String),
    Validation(String),
    RateLimited { retry_after_secs: u64 },
    /// Store failure; the message is returned to the caller as-is.
    Store(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RateLimited { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded".to_string())
            }
            AppError::Store(msg) => {
                tracing::error!("Store error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let mut response = (status, axum::Json(ErrorBody { detail: message })).into_response();

        match self {
            AppError::Auth(_) => {
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            AppError::RateLimited { retry_after_secs } => {
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
            }
            _ => {}
        }

        response
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidRange | CoreError::InvalidDateTime(_) => {
                AppError::Validation(e.to_string())
            }
            CoreError::Store(_) => AppError::Store(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{e:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn status_codes() {
        let status = |e: AppError| e.into_response().status();

        assert_eq!(status(AppError::Auth("x".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(AppError::RateLimited { retry_after_secs: 1 }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(status(AppError::Store("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(AppError::Internal("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_error_challenges_for_bearer() {
        let response = AppError::Auth("Not authenticated".into()).into_response();
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
    }

    #[test]
    fn rate_limited_sets_retry_after() {
        let response = AppError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.headers()[RETRY_AFTER], "42");
    }

    #[tokio::test]
    async fn store_error_passes_message_through() {
        let err: AppError = CoreError::Store("Lost connection to MySQL server".into()).into();
        let body = body_json(err.into_response()).await;
        assert_eq!(
            body["detail"],
            "Erro ao consultar o banco de dados: Lost connection to MySQL server"
        );
    }

    #[tokio::test]
    async fn internal_error_hides_message() {
        let err: AppError = anyhow::anyhow!("signing key exploded").into();
        let body = body_json(err.into_response()).await;
        assert_eq!(body["detail"], "Internal server error");
    }

    #[test]
    fn core_validation_errors_map_to_bad_request() {
        assert!(matches!(
            AppError::from(CoreError::InvalidRange),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(CoreError::InvalidDateTime("x".into())),
            AppError::Validation(_)
        ));
    }
}
