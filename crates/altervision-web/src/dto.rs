use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    pub cnpj: String,
    #[serde(deserialize_with = "altervision_core::sales::datetime::deserialize")]
    pub data_inicio: NaiveDateTime,
    #[serde(deserialize_with = "altervision_core::sales::datetime::deserialize")]
    pub data_fim: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
