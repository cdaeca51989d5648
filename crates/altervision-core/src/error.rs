//! Error types for `altervision-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.

use crate::sales::MAX_RANGE_DAYS;

/// Unified error type for all core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested period is wider than [`MAX_RANGE_DAYS`].
    #[error("O intervalo entre as datas não pode ser maior que {max} dias", max = MAX_RANGE_DAYS)]
    InvalidRange,

    /// A timestamp could not be parsed as an ISO 8601 date or datetime.
    #[error("invalid datetime: {0}")]
    InvalidDateTime(String),

    /// The sales store rejected the query or could not be reached.
    ///
    /// Carries the driver's message verbatim.
    #[error("Erro ao consultar o banco de dados: {0}")]
    Store(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(e: sqlx::Error) -> Self {
        CoreError::Store(e.to_string())
    }
}

/// Convenience alias used throughout `altervision-core`.
pub type CoreResult<T> = Result<T, CoreError>;
