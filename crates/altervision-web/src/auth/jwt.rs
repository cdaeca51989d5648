use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// A freshly signed bearer token and what it asserts.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 tokens with a fixed lifetime.
///
/// Nothing is stored server-side; a token is valid exactly as long as its
/// signature checks out and `exp` lies in the future.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl TokenService {
    pub fn new(secret: &str, ttl_minutes: u32) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: TimeDelta::minutes(i64::from(ttl_minutes)),
        }
    }

    pub fn issue(&self, subject: &str) -> anyhow::Result<Credential> {
        self.issue_at(subject, Utc::now())
    }

    /// Same as [`issue`](Self::issue) with the clock supplied by the caller.
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> anyhow::Result<Credential> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

        Ok(Credential {
            token,
            subject: claims.sub,
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(token_data.claims)
    }
}
