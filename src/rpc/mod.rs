//! Wire contract between the gateway and the authentication service.
//!
//! Calls travel as `POST /rpc` with an [`RpcRequest`] body naming the command.
//! The service always answers with an [`RpcReply`]: either the command's result
//! or a structured [`RpcError`] carrying an HTTP-equivalent status, so domain
//! failures cross the process boundary unchanged.

mod client;

pub use client::{AuthClient, CallError};

use serde::{Deserialize, Serialize};

/// Path the authentication service listens on.
pub const RPC_PATH: &str = "/rpc";

/// Command names understood by the authentication service.
pub mod commands {
    pub const REGISTER: &str = "register";
    pub const LOGIN: &str = "login";
    pub const GET_USERS: &str = "get_users";
    pub const GET_USER: &str = "get_user";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub cmd: String,
    #[serde(default = "empty_object")]
    pub data: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

impl RpcRequest {
    pub fn new(cmd: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            cmd: cmd.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "body", rename_all = "lowercase")]
pub enum RpcReply {
    Ok(serde_json::Value),
    Err(RpcError),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

/// Tagged error value that crosses the RPC boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("{message} ({status})")]
pub struct RpcError {
    pub kind: ErrorKind,
    pub status: u16,
    pub message: String,
}

impl RpcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: kind.status(),
            message: message.into(),
        }
    }
}
