//! Credential store: user creation, lookup and password verification
//!
//! Handlers only see the [`CredentialStore`] trait. The bundled
//! [`SqliteCredentialStore`] hashes passwords with Argon2id and relies on the
//! unique `normalized_username` column for insert-if-absent semantics.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::models::User;
use super::oauth::ProviderKind;
use crate::common::{ValidationError, ValidationResult};

const ALLOWED_USERNAME_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-._@+_";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("user rejected with {} violation(s)", .0.len())]
    Rejected(Vec<ValidationError>),

    #[error("username {username} already belongs to a {existing} account")]
    IdentityConflict { username: String, existing: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// An identity asserted by an OAuth provider, already mapped to a local username
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub username: String,
    pub provider: String,
    pub email: Option<String>,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Creates a password user, reporting every violation at once
    async fn create_user(&self, username: &str, password: &str) -> Result<User, CredentialError>;

    /// Case-insensitive lookup
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, CredentialError>;

    /// `None` still runs a full verification against a decoy hash, so the
    /// unknown-user path costs the same as a wrong password.
    async fn verify_password(
        &self,
        user: Option<&User>,
        password: &str,
    ) -> Result<bool, CredentialError>;

    /// Looks the username up first, then inserts if absent. Safe to call
    /// repeatedly and concurrently for the same identity.
    async fn find_or_create_external(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<User, CredentialError>;
}

/// Password rules, defaulting to the classic identity-store policy
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: true,
        }
    }
}

impl PasswordPolicy {
    pub fn check(&self, password: &str) -> ValidationResult {
        let mut result = ValidationResult::new();

        if password.chars().count() < self.min_length {
            result.add_error(
                "password",
                &format!("Passwords must be at least {} characters.", self.min_length),
            );
        }
        if self.require_non_alphanumeric && password.chars().all(|c| c.is_alphanumeric()) {
            result.add_error(
                "password",
                "Passwords must have at least one non alphanumeric character.",
            );
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            result.add_error("password", "Passwords must have at least one digit ('0'-'9').");
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            result.add_error(
                "password",
                "Passwords must have at least one lowercase ('a'-'z').",
            );
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            result.add_error(
                "password",
                "Passwords must have at least one uppercase ('A'-'Z').",
            );
        }

        result
    }
}

/// Rules for usernames chosen at registration
pub fn check_username(username: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    if username.chars().any(|c| !ALLOWED_USERNAME_CHARS.contains(c)) {
        result.add_error(
            "username",
            &format!(
                "Username '{}' is invalid, can only contain letters or digits.",
                username
            ),
        );
    }

    // Provider-derived names are reserved so nobody can pre-claim an OAuth identity
    let lower = username.to_lowercase();
    if ProviderKind::ALL
        .iter()
        .any(|kind| lower.starts_with(&format!("{}_", kind.name())))
    {
        result.add_error("username", &format!("Username '{}' is reserved.", username));
    }

    result
}

pub fn normalize_username(username: &str) -> String {
    username.trim().to_uppercase()
}

fn duplicate_username(username: &str) -> ValidationError {
    ValidationError::new(
        "username",
        &format!("Username '{}' is already taken.", username),
    )
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub struct SqliteCredentialStore {
    pool: SqlitePool,
    policy: PasswordPolicy,
    hasher: Argon2<'static>,
    decoy_hash: String,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Result<Self, CredentialError> {
        Self::with_hasher(pool, Argon2::default())
    }

    pub fn with_hasher(pool: SqlitePool, hasher: Argon2<'static>) -> Result<Self, CredentialError> {
        let decoy_hash = hash_with(&hasher, &Uuid::new_v4().to_string())?;
        Ok(Self {
            pool,
            policy: PasswordPolicy::default(),
            hasher,
            decoy_hash,
        })
    }

    async fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hash_with(&hasher, &password))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
    }

    async fn fetch_by_id(&self, id: &str) -> Result<User, CredentialError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }
}

fn hash_with(hasher: &Argon2<'static>, password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

fn verify_with(hasher: &Argon2<'static>, password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => hasher.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn create_user(&self, username: &str, password: &str) -> Result<User, CredentialError> {
        let username = username.trim();

        let mut result = check_username(username);
        result.merge(self.policy.check(password));
        if self.find_by_username(username).await?.is_some() {
            result.add_error("username", &duplicate_username(username).message);
        }

        if let Err(errors) = result.into_result() {
            debug!(username = %username, violations = errors.len(), "User creation rejected");
            return Err(CredentialError::Rejected(errors));
        }

        let password_hash = self.hash_password(password).await?;
        let id = Uuid::new_v4().to_string();

        let inserted = sqlx::query(
            "INSERT INTO users (id, username, normalized_username, password_hash) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(normalize_username(username))
        .bind(&password_hash)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {}
            // Lost a race with a concurrent registration of the same name
            Err(e) if is_unique_violation(&e) => {
                return Err(CredentialError::Rejected(vec![duplicate_username(username)]));
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %id, username = %username, "User registered");
        self.fetch_by_id(&id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, CredentialError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE normalized_username = ?")
            .bind(normalize_username(username))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn verify_password(
        &self,
        user: Option<&User>,
        password: &str,
    ) -> Result<bool, CredentialError> {
        // Users created through OAuth have no password and never match
        let (stored, real) = match user.and_then(|u| u.password_hash.as_deref()) {
            Some(hash) => (hash.to_string(), true),
            None => (self.decoy_hash.clone(), false),
        };

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let matched = tokio::task::spawn_blocking(move || verify_with(&hasher, &password, &stored))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;

        Ok(real && matched)
    }

    async fn find_or_create_external(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<User, CredentialError> {
        let user = match self.find_by_username(&identity.username).await? {
            Some(existing) => existing,
            None => {
                let id = Uuid::new_v4().to_string();
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO users (id, username, normalized_username, email, provider)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT(normalized_username) DO NOTHING
                    "#,
                )
                .bind(&id)
                .bind(&identity.username)
                .bind(normalize_username(&identity.username))
                .bind(identity.email.as_deref())
                .bind(&identity.provider)
                .execute(&self.pool)
                .await?;

                if inserted.rows_affected() == 1 {
                    info!(
                        user_id = %id,
                        username = %identity.username,
                        provider = %identity.provider,
                        "Created user for external identity"
                    );
                }

                // Re-read either our row or the one a concurrent login inserted
                self.find_by_username(&identity.username)
                    .await?
                    .ok_or(CredentialError::Database(sqlx::Error::RowNotFound))?
            }
        };

        match user.provider.as_deref() {
            Some(provider) if provider == identity.provider => Ok(user),
            other => Err(CredentialError::IdentityConflict {
                username: identity.username.clone(),
                existing: other.unwrap_or("password").to_string(),
            }),
        }
    }
}
