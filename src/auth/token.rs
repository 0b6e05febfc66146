//! Bearer token issuance and verification

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use thiserror::Error;

use super::models::{Claims, User};

const ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing secret is empty")]
    EmptySecret,

    #[error("failed to sign token: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("token rejected: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Signs and verifies HS512 JWTs with the server-held secret
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Fails on an empty secret; call once at startup.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::EmptySecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    fn issue_at(&self, user: &User, issued_at: i64) -> Result<String, TokenError> {
        let iat = issued_at.max(0) as usize;
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            iat,
            exp: iat + self.ttl.as_secs() as usize,
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Checks signature, algorithm and expiry
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(ALGORITHM))
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

    #[cfg(test)]
    pub fn issue_expired(&self, user: &User) -> Result<String, TokenError> {
        let ttl = self.ttl.as_secs() as i64;
        self.issue_at(user, Utc::now().timestamp() - 2 * ttl - 120)
    }
}
