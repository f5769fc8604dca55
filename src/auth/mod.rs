use crate::state::AuthState;
use axum::Router;

mod claims;
pub mod dto;
mod errors;
pub mod handlers;
pub mod jwt;
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use claims::Claims;
pub use errors::AuthError;
pub use repo::StoreError;

pub fn router() -> Router<AuthState> {
    Router::new().merge(handlers::rpc_routes())
}
