use std::sync::Arc;
use std::time::Instant;

use crate::auth::{
    jwt::JwtKeys,
    memory::MemoryUserStore,
    repo::{DynUserStore, PgUserStore},
    services::UsersService,
};
use crate::config::{AuthServiceConfig, GatewayConfig, JwtConfig};
use crate::rpc::AuthClient;

/// Dependencies of the authentication service.
#[derive(Clone)]
pub struct AuthState {
    pub users: UsersService,
}

impl AuthState {
    pub async fn init(config: &AuthServiceConfig) -> anyhow::Result<Self> {
        let store: DynUserStore = if config.database_url.starts_with("memory:") {
            tracing::warn!("DATABASE_URL selects the in-memory store; data is lost on exit");
            Arc::new(MemoryUserStore::new())
        } else {
            Arc::new(PgUserStore::connect(&config.database_url, config.max_connections).await?)
        };
        Ok(Self::from_parts(store, JwtKeys::from_config(&config.jwt)))
    }

    pub fn from_parts(store: DynUserStore, keys: JwtKeys) -> Self {
        Self {
            users: UsersService::new(store, keys),
        }
    }

    pub fn in_memory(jwt: &JwtConfig) -> Self {
        Self::from_parts(Arc::new(MemoryUserStore::new()), JwtKeys::from_config(jwt))
    }
}

/// Dependencies of the gateway.
#[derive(Clone)]
pub struct GatewayState {
    pub auth: AuthClient,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn init(config: &GatewayConfig) -> anyhow::Result<Self> {
        Ok(Self::new(AuthClient::new(
            &config.auth_service_url,
            config.rpc_timeout,
        )?))
    }

    pub fn new(auth: AuthClient) -> Self {
        Self {
            auth,
            started_at: Instant::now(),
        }
    }
}
