//! Sales aggregation: the row shape returned to callers, the validated
//! query filter, and the store abstraction that produces rows.

pub mod datetime;
pub mod repository;

use chrono::{NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Widest period, in days, a single sales query may cover.
pub const MAX_RANGE_DAYS: i64 = 31;

/// One aggregated bucket of sales: a seller's totals within one hour of one day.
///
/// Field names on the wire follow the public API contract (`data`, `hora`,
/// `nome`, `cpf`, `numVendas`, `numItens`, `valor`); column aliases in the
/// aggregation query use the same names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SalesAggregate {
    /// Calendar day, `YYYY-MM-DD`.
    #[serde(rename = "data")]
    #[sqlx(rename = "data")]
    pub date: String,
    /// Hour of day, zero-padded `HH`.
    #[serde(rename = "hora")]
    #[sqlx(rename = "hora")]
    pub hour: String,
    #[serde(rename = "nome")]
    #[sqlx(rename = "nome")]
    pub name: String,
    /// Seller's CPF, or `"Sem Cpf"` when the user record has none.
    #[serde(rename = "cpf")]
    #[sqlx(rename = "cpf")]
    pub tax_id: String,
    #[serde(rename = "numVendas")]
    #[sqlx(rename = "numVendas")]
    pub sale_count: i64,
    #[serde(rename = "numItens")]
    #[sqlx(rename = "numItens")]
    pub item_count: Decimal,
    #[serde(rename = "valor")]
    #[sqlx(rename = "valor")]
    pub total_value: Decimal,
}

/// A company-scoped time window to aggregate sales over.
///
/// Only constructible through [`SalesFilter::new`], so every instance
/// satisfies the [`MAX_RANGE_DAYS`] bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesFilter {
    cnpj: String,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl SalesFilter {
    /// Builds a filter for company `cnpj` covering `start..=end`.
    ///
    /// A reversed window (`end < start`) is accepted; it simply matches no rows.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidRange`] if `end - start` exceeds [`MAX_RANGE_DAYS`].
    pub fn new(
        cnpj: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> CoreResult<Self> {
        if end.signed_duration_since(start) > TimeDelta::days(MAX_RANGE_DAYS) {
            return Err(CoreError::InvalidRange);
        }
        Ok(Self {
            cnpj: cnpj.into(),
            start,
            end,
        })
    }

    pub fn cnpj(&self) -> &str {
        &self.cnpj
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }
}
