use std::num::NonZeroU32;
use std::sync::Arc;

use altervision_core::SalesRepository;
use anyhow::Context;

use crate::auth::jwt::TokenService;
use crate::config::ServerConfig;
use crate::middleware::rate_limit::{ClientKeyExtractor, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub tokens: Arc<TokenService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub sales: Arc<dyn SalesRepository>,
}

impl AppState {
    pub fn new(config: ServerConfig, sales: Arc<dyn SalesRepository>) -> anyhow::Result<Self> {
        let tokens = TokenService::new(
            &config.auth.secret_key,
            config.auth.access_token_expire_minutes,
        );
        let rpm = NonZeroU32::new(config.rate_limit.requests_per_minute)
            .context("RATE_LIMIT_PER_MINUTE must be at least 1")?;
        let key_extractor = if config.rate_limit.trust_forwarded_for {
            ClientKeyExtractor::Forwarded
        } else {
            ClientKeyExtractor::Peer
        };
        let rate_limiter = RateLimiter::per_minute(rpm).with_key_extractor(key_extractor);

        Ok(Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            rate_limiter: Arc::new(rate_limiter),
            sales,
        })
    }
}
