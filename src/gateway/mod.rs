//! Public HTTP surface: validates request shape, forwards to the
//! authentication service over RPC and translates the outcome.

use crate::state::GatewayState;
use axum::Router;

pub mod dto;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod health;

pub use errors::{ApiError, FieldError};

pub fn router() -> Router<GatewayState> {
    Router::new()
        .merge(handlers::root_routes())
        .merge(handlers::auth_routes())
        .merge(health::health_routes())
}
