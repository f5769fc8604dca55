use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::PublicUser;

/// Payload of the `register` command.
#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Payload of the `login` command.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Payload of the `get_user` command.
#[derive(Debug, Deserialize)]
pub struct FindUserPayload {
    pub id: Uuid,
}

/// Reply to a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: PublicUser,
}
