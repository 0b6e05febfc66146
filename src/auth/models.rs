//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// JWT claims structure
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: usize,
    pub exp: usize,
}

/// User database model
#[derive(FromRow, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub normalized_username: String,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub provider: Option<String>,
    pub created_at: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("provider", &self.provider)
            .field("has_password", &self.password_hash.is_some())
            .finish()
    }
}

/// Body of `POST /auth/register` and `POST /auth/login`
///
/// Missing fields deserialize as empty strings so the validator can report them.
#[derive(Deserialize, Serialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
}

/// Query string the provider sends back to the callback route
#[derive(Deserialize, Debug)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
}
