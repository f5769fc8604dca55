use axum::{extract::State, routing::post, Json, Router};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, instrument, warn};

use crate::{
    auth::{
        dto::{FindUserPayload, LoginPayload, RegisterPayload},
        errors::AuthError,
    },
    rpc::{commands, ErrorKind, RpcError, RpcReply, RpcRequest, RPC_PATH},
    state::AuthState,
};

pub fn rpc_routes() -> Router<AuthState> {
    Router::new().route(RPC_PATH, post(dispatch))
}

/// Routes one command to the users service and wraps the outcome in an [`RpcReply`].
#[instrument(skip(state, request), fields(cmd = %request.cmd))]
pub async fn dispatch(
    State(state): State<AuthState>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcReply> {
    let users = &state.users;
    let RpcRequest { cmd, data } = request;

    let outcome = match cmd.as_str() {
        commands::REGISTER => match parse::<RegisterPayload>(data) {
            Ok(p) => respond(users.register(p).await),
            Err(e) => Err(e),
        },
        commands::LOGIN => match parse::<LoginPayload>(data) {
            Ok(p) => respond(users.login(p).await),
            Err(e) => Err(e),
        },
        commands::GET_USERS => respond(users.list_active_users().await),
        commands::GET_USER => match parse::<FindUserPayload>(data) {
            Ok(p) => respond(users.find_by_id(p.id).await),
            Err(e) => Err(e),
        },
        other => {
            warn!(cmd = %other, "unknown rpc command");
            Err(RpcError::new(
                ErrorKind::NotFound,
                format!("No handler for command '{}'", other),
            ))
        }
    };

    Json(match outcome {
        Ok(body) => RpcReply::Ok(body),
        Err(err) => RpcReply::Err(err),
    })
}

fn parse<T: DeserializeOwned>(data: serde_json::Value) -> Result<T, RpcError> {
    serde_json::from_value(data).map_err(|e| {
        warn!(error = %e, "rpc payload rejected");
        RpcError::new(ErrorKind::Validation, format!("Invalid payload: {}", e))
    })
}

fn respond<T: Serialize>(result: Result<T, AuthError>) -> Result<serde_json::Value, RpcError> {
    match result {
        Ok(value) => serde_json::to_value(value).map_err(|e| {
            error!(error = %e, "serialize rpc reply failed");
            RpcError::new(ErrorKind::Internal, "Internal server error")
        }),
        Err(err) => {
            if let AuthError::Internal(cause) = &err {
                error!(error = ?cause, "internal error");
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use serde_json::json;

    fn state() -> AuthState {
        AuthState::in_memory(&JwtConfig {
            secret: "test".into(),
            ttl_minutes: 5,
        })
    }

    async fn call(state: &AuthState, cmd: &str, data: serde_json::Value) -> RpcReply {
        let Json(reply) = dispatch(State(state.clone()), Json(RpcRequest::new(cmd, data))).await;
        reply
    }

    fn expect_err(reply: RpcReply) -> RpcError {
        match reply {
            RpcReply::Err(e) => e,
            RpcReply::Ok(body) => panic!("expected error, got {body}"),
        }
    }

    #[tokio::test]
    async fn register_then_get_users() {
        let state = state();
        let reply = call(
            &state,
            commands::REGISTER,
            json!({ "email": "a@x.com", "name": "Ann", "password": "secret1" }),
        )
        .await;
        let RpcReply::Ok(user) = reply else {
            panic!("register failed");
        };
        assert_eq!(user["email"], "a@x.com");
        assert!(user.get("password").is_none());
        assert!(user.get("passwordHash").is_none());

        let RpcReply::Ok(list) = call(&state, commands::GET_USERS, json!({})).await else {
            panic!("get_users failed");
        };
        assert_eq!(list.as_array().map(Vec::len), Some(1));

        let id = user["id"].as_str().unwrap().to_string();
        let RpcReply::Ok(found) = call(&state, commands::GET_USER, json!({ "id": id })).await
        else {
            panic!("get_user failed");
        };
        assert_eq!(found, user);
    }

    #[tokio::test]
    async fn malformed_payload_is_a_validation_error() {
        let err = expect_err(call(&state(), commands::LOGIN, json!({ "email": 42 })).await);
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.status, 400);
    }

    #[tokio::test]
    async fn unknown_command_is_not_found() {
        let err = expect_err(call(&state(), "drop_users", json!({})).await);
        assert_eq!(err.status, 404);
        assert!(err.message.contains("drop_users"));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let err = expect_err(
            call(
                &state(),
                commands::GET_USER,
                json!({ "id": uuid::Uuid::new_v4() }),
            )
            .await,
        );
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "User not found");
    }
}
