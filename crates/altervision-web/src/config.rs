use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;
use sqlx::mysql::MySqlConnectOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "default_token_ttl_minutes")]
    pub access_token_expire_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rpm")]
    pub requests_per_minute: u32,
    /// Key clients on `X-Forwarded-For`/`X-Real-IP`/`Forwarded` instead of
    /// the socket peer. Only safe behind a proxy that overwrites them.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

/// MySQL connection parameters. `url`, when set, wins over the discrete fields.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_db_name")]
    pub name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_token_ttl_minutes() -> u32 { 30 }
fn default_rpm() -> u32 { 60 }
fn default_db_host() -> String { "localhost".to_string() }
fn default_db_port() -> u16 { 3306 }
fn default_db_user() -> String { "root".to_string() }
fn default_db_name() -> String { "altervision".to_string() }
fn default_max_connections() -> u32 { 10 }

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            access_token_expire_minutes: default_token_ttl_minutes(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_rpm(),
            trust_forwarded_for: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: String::new(),
            name: default_db_name(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"[REDACTED]")
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .finish()
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> anyhow::Result<MySqlConnectOptions> {
        if let Some(url) = &self.url {
            return MySqlConnectOptions::from_str(url).context("invalid DATABASE_URL");
        }
        Ok(MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name))
    }
}

fn parse_var<T>(name: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {name}: {value:?}"))
}

impl ServerConfig {
    /// Reads the optional TOML file named by `ALTERVISION_CONFIG`, then
    /// applies environment overrides and validates the result.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("ALTERVISION_CONFIG").map(PathBuf::from) {
            Ok(path) => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                toml::from_str(&contents)?
            }
            Err(_) => ServerConfig::default(),
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        config.finalize()?;
        Ok(config)
    }

    /// Overrides fields from variables resolved through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(addr) = var("BIND_ADDR") {
            self.bind_addr = parse_var("BIND_ADDR", &addr)?;
        }

        if let Some(secret) = var("SECRET_KEY") {
            self.auth.secret_key = secret;
        }
        if let Some(minutes) = var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.auth.access_token_expire_minutes =
                parse_var("ACCESS_TOKEN_EXPIRE_MINUTES", &minutes)?;
        }

        if let Some(rpm) = var("RATE_LIMIT_PER_MINUTE") {
            self.rate_limit.requests_per_minute = parse_var("RATE_LIMIT_PER_MINUTE", &rpm)?;
        }
        if let Some(trust) = var("TRUST_FORWARDED_FOR") {
            self.rate_limit.trust_forwarded_for = parse_var("TRUST_FORWARDED_FOR", &trust)?;
        }

        if let Some(url) = var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(host) = var("DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = var("DB_PORT") {
            self.database.port = parse_var("DB_PORT", &port)?;
        }
        if let Some(user) = var("DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = var("DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(name) = var("DB_NAME") {
            self.database.name = name;
        }
        if let Some(max) = var("DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("DB_MAX_CONNECTIONS", &max)?;
        }

        Ok(())
    }

    /// Fills in a signing secret when none is configured and rejects
    /// settings the server cannot run with.
    pub fn finalize(&mut self) -> anyhow::Result<()> {
        if self.auth.secret_key.is_empty() {
            self.auth.secret_key = uuid::Uuid::new_v4().to_string();
            tracing::warn!(
                "No SECRET_KEY configured. Generated random secret (tokens will not survive a restart)."
            );
        }

        const WEAK_SECRETS: &[&str] = &[
            "change-me",
            "changeme",
            "secret",
            "password",
            "your-secret-key",
        ];
        if WEAK_SECRETS.iter().any(|&w| self.auth.secret_key == w) {
            anyhow::bail!(
                "SECRET_KEY matches a known weak/placeholder value. \
                 Set a strong random secret via the SECRET_KEY environment variable."
            );
        }
        if self.auth.secret_key.len() < 32 {
            tracing::warn!(
                "SECRET_KEY is shorter than 32 characters. Consider using a stronger secret."
            );
        }

        if self.auth.access_token_expire_minutes == 0 {
            anyhow::bail!("ACCESS_TOKEN_EXPIRE_MINUTES must be at least 1");
        }
        if self.rate_limit.requests_per_minute == 0 {
            anyhow::bail!("RATE_LIMIT_PER_MINUTE must be at least 1");
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        Ok(())
    }
}
