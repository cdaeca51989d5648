//! Store access for sales aggregates.
//!
//! [`SalesRepository`] is the seam the HTTP layer talks to;
//! [`MySqlSalesRepository`] is the production implementation backed by a
//! lazily-connected `sqlx` pool.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use super::{SalesAggregate, SalesFilter};
use crate::error::CoreResult;

/// Per-seller, per-hour sales totals for one branch.
///
/// Binds, in order: window start, window end, branch cnpj (`filial.cgc`).
/// Only live (`cancelado = 'N'`, `apagado = 'N'`) sale operations
/// (`oper IN (2, 3)`) count, and deliveries only once they have arrived.
/// Rows come back in store order.
pub const SALES_AGGREGATE_SQL: &str = r#"
SELECT
    DATE_FORMAT(mov.data_hora, '%Y-%m-%d') AS data,
    DATE_FORMAT(mov.data_hora, '%H') AS hora,
    u.nome AS nome,
    COALESCE(u.CPF, 'Sem Cpf') AS cpf,
    COUNT(DISTINCT numlanc) AS numVendas,
    CAST(COALESCE(SUM(quanti_uni), 0) AS DECIMAL(65, 10)) AS numItens,
    CAST(COALESCE(SUM(valor_tot), 0) AS DECIMAL(65, 10)) AS valor
FROM movment mov
JOIN usuario u ON mov.usuario_id = u.usuario_id
JOIN filial f ON mov.filial_id = f.filial_id
WHERE mov.cancelado = 'N'
  AND mov.apagado = 'N'
  AND mov.oper IN (2, 3)
  AND ((mov.entrega = 'N') OR (mov.dtchegada_entrega IS NOT NULL))
  AND mov.data_hora BETWEEN ? AND ?
  AND mov.produto_id NOT IN (8105081)
  AND f.cgc = ?
GROUP BY 1, 2, 3, 4
"#;

/// Source of sales aggregates.
#[async_trait]
pub trait SalesRepository: Send + Sync {
    /// Runs the aggregation for `filter`.
    ///
    /// # Errors
    ///
    /// [`CoreError::Store`](crate::CoreError::Store) with the driver's
    /// message when the query cannot be executed.
    async fn aggregate_sales(&self, filter: &SalesFilter) -> CoreResult<Vec<SalesAggregate>>;
}

/// [`SalesRepository`] over a MySQL connection pool.
#[derive(Debug, Clone)]
pub struct MySqlSalesRepository {
    pool: MySqlPool,
}

impl MySqlSalesRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository whose pool opens connections on first use, so
    /// the server can start while the database is unreachable.
    pub fn connect_lazy(options: MySqlConnectOptions, max_connections: u32) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy_with(options);
        Self::new(pool)
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl SalesRepository for MySqlSalesRepository {
    async fn aggregate_sales(&self, filter: &SalesFilter) -> CoreResult<Vec<SalesAggregate>> {
        let rows = sqlx::query_as::<_, SalesAggregate>(SALES_AGGREGATE_SQL)
            .bind(filter.start())
            .bind(filter.end())
            .bind(filter.cnpj())
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(cnpj = filter.cnpj(), "sales query failed: {e}"))?;

        tracing::debug!(cnpj = filter.cnpj(), rows = rows.len(), "sales query finished");
        Ok(rows)
    }
}
