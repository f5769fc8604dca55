use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::{
    gateway::{
        dto::{LoginRequest, RegisterRequest},
        errors::ApiError,
        extractors::ValidatedJson,
    },
    rpc::{commands, CallError},
    state::GatewayState,
};

pub fn auth_routes() -> Router<GatewayState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/users", get(get_users))
}

pub fn root_routes() -> Router<GatewayState> {
    Router::new().route("/", get(api_info))
}

fn log_failure(op: &str, err: &CallError) {
    if let CallError::Remote(remote) = err {
        warn!(op, status = remote.status, message = %remote.message, "rejected by authentication service");
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<GatewayState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    info!(email = %payload.email, "registration attempt");
    let user = state
        .auth
        .send(commands::REGISTER, &payload)
        .await
        .map_err(|e| {
            log_failure("register", &e);
            ApiError::from(e)
        })?;
    info!(email = %payload.email, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<GatewayState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    info!(email = %payload.email, "login attempt");
    let session = state
        .auth
        .send(commands::LOGIN, &payload)
        .await
        .map_err(|e| {
            log_failure("login", &e);
            ApiError::from(e)
        })?;
    info!(email = %payload.email, "user logged in");
    Ok(Json(session))
}

#[instrument(skip(state))]
pub async fn get_users(State(state): State<GatewayState>) -> Result<Json<Value>, ApiError> {
    let users = state
        .auth
        .send(commands::GET_USERS, &json!({}))
        .await
        .map_err(|e| {
            log_failure("get_users", &e);
            ApiError::from(e)
        })?;
    info!(
        count = users.as_array().map(Vec::len).unwrap_or(0),
        "fetched users"
    );
    Ok(Json(users))
}

pub async fn api_info() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the authgate API Gateway",
        "version": "1.0",
        "endpoints": {
            "auth": {
                "register": "POST /auth/register",
                "login": "POST /auth/login",
                "users": "GET /auth/users",
            },
            "health": "GET /health",
        },
    }))
}
