use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /auth/register`.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(
        min = 2,
        max = 50,
        message = "Name must be between 2 and 50 characters long"
    ))]
    pub name: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}
