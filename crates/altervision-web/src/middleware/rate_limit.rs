//! Per-client request quota for the sales endpoint.
//!
//! A keyed GCRA limiter (`governor`) allows `requests_per_minute` requests
//! per client address as a burst, replenishing one slot every
//! `60 / requests_per_minute` seconds. Clients are keyed on the socket peer;
//! forwarding headers are only consulted when the deployment opts in with
//! `TRUST_FORWARDED_FOR`.

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::time::Duration;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::Request;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota};
use tower_governor::key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor};
use tower_governor::GovernorError;

use crate::error::AppError;
use crate::state::AppState;

/// How the client address used as the quota key is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKeyExtractor {
    /// The TCP peer from `ConnectInfo`.
    Peer,
    /// `X-Forwarded-For`, `X-Real-IP`, `Forwarded`, then the TCP peer.
    /// Only correct behind a proxy that overwrites those headers.
    Forwarded,
}

impl KeyExtractor for ClientKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        match self {
            Self::Peer => PeerIpKeyExtractor.extract(req),
            Self::Forwarded => SmartIpKeyExtractor.extract(req),
        }
    }
}

pub struct RateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    key_extractor: ClientKeyExtractor,
}

impl RateLimiter {
    pub fn per_minute(requests_per_minute: NonZeroU32) -> Self {
        Self {
            limiter: governor::RateLimiter::keyed(Quota::per_minute(requests_per_minute)),
            key_extractor: ClientKeyExtractor::Peer,
        }
    }

    pub fn with_key_extractor(mut self, key_extractor: ClientKeyExtractor) -> Self {
        self.key_extractor = key_extractor;
        self
    }

    /// Records one request from `client` and reports whether it fits the quota.
    pub fn allow(&self, client: IpAddr) -> bool {
        self.check(client).is_ok()
    }

    /// Like [`allow`](Self::allow), but on rejection returns how long `client`
    /// must wait before its next request can succeed.
    pub fn check(&self, client: IpAddr) -> Result<(), Duration> {
        self.limiter
            .check_key(&client)
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }

    /// [`check`](Self::check) mapped onto the HTTP error for a rejected request.
    pub fn enforce(&self, client: IpAddr) -> Result<(), AppError> {
        self.check(client).map_err(|wait| {
            tracing::warn!(%client, "Rate limit exceeded");
            AppError::RateLimited {
                retry_after_secs: wait.as_secs().max(1),
            }
        })
    }

    /// Resolves the quota key for a request.
    pub fn client_addr<T>(&self, req: &Request<T>) -> Result<IpAddr, GovernorError> {
        self.key_extractor.extract(req)
    }

    /// Drops state for clients whose quota has fully replenished.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }

    /// Number of client addresses currently tracked.
    pub fn len(&self) -> usize {
        self.limiter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiter.is_empty()
    }
}

/// The caller's address as the rate limiter keys it.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub IpAddr);

impl FromRequestParts<AppState> for ClientAddr {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut req = Request::new(());
        *req.headers_mut() = parts.headers.clone();
        if let Some(peer) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            req.extensions_mut().insert(*peer);
        }

        state.rate_limiter.client_addr(&req).map(ClientAddr).map_err(|e| {
            tracing::warn!("Unable to determine client address: {e}");
            AppError::Internal("Unable to determine client address".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quota(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn allows_up_to_quota_then_rejects() {
        let limiter = RateLimiter::per_minute(quota(3));
        let client: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(limiter.allow(client));
        assert!(limiter.allow(client));
        assert!(limiter.allow(client));
        assert!(!limiter.allow(client));
        assert!(!limiter.allow(client));
    }

    #[test]
    fn clients_have_independent_quotas() {
        let limiter = RateLimiter::per_minute(quota(1));
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.allow(a));
        assert!(!limiter.allow(a));
        assert!(limiter.allow(b));
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn rejection_reports_wait_within_window() {
        let limiter = RateLimiter::per_minute(quota(2));
        let client: IpAddr = "::1".parse().unwrap();

        assert!(limiter.check(client).is_ok());
        assert!(limiter.check(client).is_ok());
        let wait = limiter.check(client).unwrap_err();
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(30));
    }

    #[test]
    fn enforce_rejects_with_retry_after() {
        let limiter = RateLimiter::per_minute(quota(1));
        let client: IpAddr = "10.0.0.3".parse().unwrap();

        assert!(limiter.enforce(client).is_ok());
        match limiter.enforce(client) {
            Err(AppError::RateLimited { retry_after_secs }) => {
                assert!((1..=60).contains(&retry_after_secs))
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    fn request_from(peer: [u8; 4], forwarded_for: Option<&str>) -> Request<()> {
        let mut builder = Request::get("/vendas");
        if let Some(xff) = forwarded_for {
            builder = builder.header("x-forwarded-for", xff);
        }
        builder
            .extension(ConnectInfo(SocketAddr::from((peer, 40000))))
            .body(())
            .unwrap()
    }

    #[test]
    fn peer_key_ignores_forwarding_headers() {
        let limiter = RateLimiter::per_minute(quota(1));
        let req = request_from([203, 0, 113, 9], Some("10.0.0.1"));
        assert_eq!(
            limiter.client_addr(&req).unwrap(),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn forwarded_key_prefers_forwarding_headers() {
        let limiter =
            RateLimiter::per_minute(quota(1)).with_key_extractor(ClientKeyExtractor::Forwarded);
        let req = request_from([203, 0, 113, 9], Some("10.0.0.1"));
        assert_eq!(
            limiter.client_addr(&req).unwrap(),
            "10.0.0.1".parse::<IpAddr>().unwrap()
        );

        let req = request_from([203, 0, 113, 9], None);
        assert_eq!(
            limiter.client_addr(&req).unwrap(),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn missing_peer_is_unresolvable() {
        let limiter = RateLimiter::per_minute(quota(1));
        let req = Request::get("/vendas")
            .header("x-forwarded-for", "10.0.0.1")
            .body(())
            .unwrap();
        assert!(limiter.client_addr(&req).is_err());
    }

    #[test]
    fn concurrent_checks_never_exceed_quota() {
        let limiter = std::sync::Arc::new(RateLimiter::per_minute(quota(50)));
        let client: IpAddr = "192.168.1.7".parse().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || (0..20).filter(|_| limiter.allow(client)).count())
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 50);
    }
}
