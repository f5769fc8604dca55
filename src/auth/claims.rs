use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload issued on login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,     // user ID
    pub email: String, // normalized email
    pub name: String,  // display name
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
}
