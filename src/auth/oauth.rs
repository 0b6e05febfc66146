//! Third-party OAuth client: authorize redirect, code exchange, profile fetch
//! and local user resolution
//!
//! Providers are described by [`ProviderKind`]; credentials come from
//! configuration. Nothing in [`OAuthError`] is ever shown to the browser: the
//! callback handler logs it and redirects with a fixed message.

use reqwest::{header::ACCEPT, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::credentials::{CredentialError, CredentialStore, ExternalIdentity};
use super::token::{TokenError, TokenService};
use crate::common::config::{AppConfig, OAuthCredentials};

const USER_AGENT: &str = "JobApplicationTrackerAPI";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("request to provider failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("provider returned HTTP {0}")]
    UpstreamStatus(StatusCode),

    #[error("provider refused the code exchange: {0}")]
    ExchangeRefused(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("could not resolve local user: {0}")]
    UserResolution(#[from] CredentialError),

    #[error("could not issue token: {0}")]
    TokenIssue(#[from] TokenError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    GitHub,
    Google,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::GitHub, ProviderKind::Google];

    /// Route segment and username prefix
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::Google => "google",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "GitHub",
            ProviderKind::Google => "Google",
        }
    }

    fn authorize_url(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "https://github.com/login/oauth/authorize",
            ProviderKind::Google => "https://accounts.google.com/o/oauth2/v2/auth",
        }
    }

    fn token_url(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "https://github.com/login/oauth/access_token",
            ProviderKind::Google => "https://oauth2.googleapis.com/token",
        }
    }

    fn profile_url(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "https://api.github.com/user",
            ProviderKind::Google => "https://openidconnect.googleapis.com/v1/userinfo",
        }
    }

    fn scope(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "user:email",
            ProviderKind::Google => "openid email profile",
        }
    }

    /// Pulls the stable numeric account id out of a profile document
    pub fn parse_profile(&self, body: &Value) -> Result<ProviderProfile, OAuthError> {
        let id = match self {
            ProviderKind::GitHub => body
                .get("id")
                .and_then(Value::as_i64)
                .map(|id| id.to_string()),
            ProviderKind::Google => body
                .get("sub")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| {
            OAuthError::MalformedResponse(format!("{} profile has no numeric id", self.name()))
        })?;

        let login = match self {
            ProviderKind::GitHub => body.get("login"),
            ProviderKind::Google => body.get("name"),
        }
        .and_then(Value::as_str)
        .map(str::to_string);

        let email = body
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(ProviderProfile { id, login, email })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub id: String,
    pub login: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// One configured provider
#[derive(Clone)]
pub struct OAuthProvider {
    pub kind: ProviderKind,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorize_url: String,
    token_url: String,
    profile_url: String,
}

impl OAuthProvider {
    pub fn new(kind: ProviderKind, credentials: &OAuthCredentials, public_base_url: &str) -> Self {
        Self {
            kind,
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            redirect_uri: format!("{}/auth/{}-callback", public_base_url, kind.name()),
            authorize_url: kind.authorize_url().to_string(),
            token_url: kind.token_url().to_string(),
            profile_url: kind.profile_url().to_string(),
        }
    }

    /// Points every endpoint at `base`, for a local stand-in provider
    #[cfg(test)]
    pub fn with_base_url(mut self, base: &str) -> Self {
        self.authorize_url = format!("{}/authorize", base);
        self.token_url = format!("{}/token", base);
        self.profile_url = format!("{}/user", base);
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn authorization_url(&self) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            self.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(self.kind.scope())
        )
    }

    /// Deterministic local username, e.g. `github_583231`
    pub fn local_username(&self, profile: &ProviderProfile) -> String {
        format!("{}_{}", self.name(), profile.id)
    }
}

/// Outcome of a completed callback
#[derive(Debug)]
pub struct SignIn {
    pub token: String,
    pub username: String,
}

#[derive(Clone)]
pub struct OAuthClient {
    http: Client,
    providers: Arc<HashMap<&'static str, OAuthProvider>>,
}

impl OAuthClient {
    pub fn new(http: Client, providers: Vec<OAuthProvider>) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| (provider.name(), provider))
            .collect();
        Self {
            http,
            providers: Arc::new(providers),
        }
    }

    /// Builds the HTTP client with the outbound timeout and every provider that
    /// has credentials configured
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .no_proxy()
            .timeout(config.outbound_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let providers = ProviderKind::ALL
            .iter()
            .filter_map(|kind| {
                let credentials = match kind {
                    ProviderKind::GitHub => config.github.as_ref(),
                    ProviderKind::Google => config.google.as_ref(),
                }?;
                Some(OAuthProvider::new(*kind, credentials, &config.public_base_url))
            })
            .collect();

        Ok(Self::new(http, providers))
    }

    pub fn provider(&self, name: &str) -> Option<&OAuthProvider> {
        self.providers.get(name)
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.providers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Trades an authorization code for a provider access token
    pub async fn exchange_code(
        &self,
        provider: &OAuthProvider,
        code: &str,
    ) -> Result<String, OAuthError> {
        let params = [
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", provider.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!(provider = provider.name(), "Exchanging authorization code for access token");

        let response = self
            .http
            .post(&provider.token_url)
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                provider = provider.name(),
                status = %status,
                body = %truncate(&body, 200),
                "Token exchange failed"
            );
            return Err(OAuthError::UpstreamStatus(status));
        }

        // GitHub reports a bad code as 200 with an `error` member
        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::MalformedResponse(e.to_string()))?;

        if let Some(error) = token.error {
            let description = token.error_description.unwrap_or_default();
            return Err(OAuthError::ExchangeRefused(format!("{} {}", error, description)));
        }

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OAuthError::MalformedResponse("missing access_token".to_string()))
    }

    pub async fn fetch_profile(
        &self,
        provider: &OAuthProvider,
        access_token: &str,
    ) -> Result<ProviderProfile, OAuthError> {
        let response = self
            .http
            .get(&provider.profile_url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(provider = provider.name(), status = %status, "Profile fetch failed");
            return Err(OAuthError::UpstreamStatus(status));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| OAuthError::MalformedResponse(e.to_string()))?;

        provider.kind.parse_profile(&body)
    }

    /// Runs exchange, profile fetch, user resolution and token issue in order
    pub async fn complete_sign_in(
        &self,
        provider: &OAuthProvider,
        code: &str,
        credentials: &dyn CredentialStore,
        tokens: &TokenService,
    ) -> Result<SignIn, OAuthError> {
        let access_token = self.exchange_code(provider, code).await?;
        let profile = self.fetch_profile(provider, &access_token).await?;

        let identity = ExternalIdentity {
            username: provider.local_username(&profile),
            provider: provider.name().to_string(),
            email: profile.email.clone(),
        };
        let user = credentials.find_or_create_external(&identity).await?;
        let token = tokens.issue(&user)?;

        info!(
            user_id = %user.id,
            provider = provider.name(),
            provider_login = ?profile.login,
            "OAuth sign-in completed"
        );

        Ok(SignIn {
            token,
            username: user.username,
        })
    }
}

/// `<frontend>/auth/<provider>-callback?<query>` with every value URL-escaped
pub fn frontend_redirect(frontend_url: &str, provider: &str, query: &[(&str, &str)]) -> String {
    let query = query
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}/auth/{}-callback?{}", frontend_url, provider, query)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn github() -> OAuthProvider {
        OAuthProvider::new(
            ProviderKind::GitHub,
            &OAuthCredentials {
                client_id: "client id".to_string(),
                client_secret: "shh".to_string(),
            },
            "http://localhost:8080",
        )
    }

    #[test]
    fn test_authorization_url() {
        let url = github().authorization_url();

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fgithub-callback"
        ));
        assert!(url.contains("scope=user%3Aemail"));
        assert!(!url.contains("shh"));
    }

    #[test]
    fn test_local_username_is_deterministic() {
        let provider = github();
        let profile = ProviderKind::GitHub
            .parse_profile(&json!({"id": 583231, "login": "octocat"}))
            .unwrap();

        assert_eq!(provider.local_username(&profile), "github_583231");
        assert_eq!(
            provider.local_username(&profile),
            provider.local_username(&profile.clone())
        );
    }

    #[test]
    fn test_parse_profile_rejects_missing_or_odd_ids() {
        assert!(ProviderKind::GitHub
            .parse_profile(&json!({"login": "octocat"}))
            .is_err());
        assert!(ProviderKind::GitHub
            .parse_profile(&json!({"id": "583231"}))
            .is_err());
        assert!(ProviderKind::Google
            .parse_profile(&json!({"sub": "../admin"}))
            .is_err());

        let google = ProviderKind::Google
            .parse_profile(&json!({"sub": "1090", "email": "a@example.com"}))
            .unwrap();
        assert_eq!(google.id, "1090");
        assert_eq!(google.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_frontend_redirect_escapes_values() {
        let url = frontend_redirect(
            "http://localhost:4200",
            "github",
            &[("token", "a.b+c/d"), ("username", "github_1")],
        );
        assert_eq!(
            url,
            "http://localhost:4200/auth/github-callback?token=a.b%2Bc%2Fd&username=github_1"
        );
    }
}
