use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use super::AnonKey;

/// User record as returned by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Profile-metadata slot; registration stores the display name under
/// `full_name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
}

impl ProviderUser {
    pub fn display_name(&self) -> String {
        self.user_metadata.full_name.clone().unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Sign-in refused because the account's e-mail is still unconfirmed.
    /// The one failure kind kept distinct for the client.
    #[error("e-mail not confirmed")]
    EmailNotConfirmed,
    /// Every other sign-in failure, transport errors included.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Sign-up refused; carries the provider's message for the caller.
    #[error("{0}")]
    Rejected(String),
}

/// End-user auth operations against the external identity provider.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Create an account in *unconfirmed* state; the provider dispatches the
    /// confirmation e-mail out of band.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(), IdentityError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, IdentityError>;
}

/// GoTrue-backed identity client, authenticated with the anon key.
pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: AnonKey,
}

impl GoTrueClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, anon_key: AnonKey) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            anon_key,
        }
    }
}

/// Error body shapes GoTrue has used across versions.
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ProviderErrorBody {
    fn message(&self) -> &str {
        self.msg
            .as_deref()
            .or(self.error_description.as_deref())
            .or(self.message.as_deref())
            .unwrap_or("identity provider error")
    }

    fn is_email_not_confirmed(&self) -> bool {
        self.error_code.as_deref() == Some("email_not_confirmed")
            || self.message().eq_ignore_ascii_case("email not confirmed")
    }
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    user: ProviderUser,
}

#[async_trait]
impl IdentityClient for GoTrueClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(), IdentityError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        let body = json!({
            "email": email,
            "password": password,
            "data": { "full_name": display_name },
        });

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key.0)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("identity provider unreachable during sign-up: {e}");
                IdentityError::Rejected("failed to register user".to_string())
            })?;

        if response.status().is_success() {
            return Ok(());
        }

        let error: ProviderErrorBody = response.json().await.unwrap_or_default();
        tracing::error!("identity provider rejected sign-up: {}", error.message());
        Err(IdentityError::Rejected(error.message().to_string()))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderUser, IdentityError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let body = json!({ "email": email, "password": password });

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key.0)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("identity provider unreachable during sign-in: {e}");
                IdentityError::InvalidCredentials
            })?;

        if response.status().is_success() {
            let signed_in: SignInResponse = response
                .json()
                .await
                .map_err(|_| IdentityError::InvalidCredentials)?;
            return Ok(signed_in.user);
        }

        let error: ProviderErrorBody = response.json().await.unwrap_or_default();
        if error.is_email_not_confirmed() {
            return Err(IdentityError::EmailNotConfirmed);
        }

        // Collapse everything else so callers cannot probe for accounts.
        tracing::error!("identity provider sign-in error: {}", error.message());
        Err(IdentityError::InvalidCredentials)
    }
}
