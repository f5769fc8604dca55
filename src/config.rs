use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

/// Settings for the authentication service process.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthServiceConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

/// Origins the gateway answers CORS preflights for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub auth_service_url: String,
    pub rpc_timeout: Duration,
    pub cors: CorsOrigins,
}

impl AuthServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: var("JWT_SECRET").context("JWT_SECRET must be set")?,
            ttl_minutes: parse_or(&var, "JWT_TTL_MINUTES", 60 * 24)?,
        };
        anyhow::ensure!(!jwt.secret.is_empty(), "JWT_SECRET must not be empty");
        anyhow::ensure!(jwt.ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");

        Ok(Self {
            database_url,
            max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", 10)?,
            jwt,
            host: var("AUTH_SERVICE_HOST").unwrap_or_else(|| "127.0.0.1".into()),
            port: parse_or(&var, "AUTH_SERVICE_PORT", 3001)?,
        })
    }

    /// Host and port to bind. The host may be a name such as `localhost`.
    pub fn listen_on(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth_host = var("AUTH_SERVICE_HOST").unwrap_or_else(|| "127.0.0.1".into());
        let auth_port: u16 = parse_or(&var, "AUTH_SERVICE_PORT", 3001)?;
        let production = var("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));

        let rpc_timeout_secs: u64 = parse_or(&var, "RPC_TIMEOUT_SECS", 5)?;
        anyhow::ensure!(rpc_timeout_secs > 0, "RPC_TIMEOUT_SECS must be positive");

        Ok(Self {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&var, "APP_PORT", 3000)?,
            auth_service_url: format!("http://{}:{}", auth_host, auth_port),
            rpc_timeout: Duration::from_secs(rpc_timeout_secs),
            cors: parse_origins(var("ALLOWED_ORIGINS").as_deref(), production),
        })
    }

    pub fn listen_on(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} must be a valid number, got {:?}", key, raw)),
        None => Ok(default),
    }
}

fn parse_origins(raw: Option<&str>, production: bool) -> CorsOrigins {
    match raw.map(str::trim) {
        Some("*") => CorsOrigins::Any,
        Some(list) => CorsOrigins::List(
            list.split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect(),
        ),
        // production must opt in explicitly
        None if production => CorsOrigins::List(Vec::new()),
        None => CorsOrigins::Any,
    }
}
