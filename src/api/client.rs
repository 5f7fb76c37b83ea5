//! HTTP client for the identity provider's token and account endpoints.
//!
//! This client is deliberately thin: it speaks the provider's JSON wire
//! shapes and maps failures into `AuthError`, leaving all session state
//! to the session controller.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::AuthError;
use crate::auth::CredentialPair;

/// Default request timeout in seconds.
/// 10s fails fast enough that a renewal stuck behind a dead provider does
/// not stall every outgoing call for long. Tunable via `Config`.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct TokenPairResponse {
    access: String,
    refresh: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    full_name: &'a str,
    email: &'a str,
    password: &'a str,
    password2: &'a str,
}

/// Identity-provider client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ProviderClient {
    client: Client,
    base_url: String,
}

impl ProviderClient {
    /// Create a client for the provider at `base_url` (no trailing slash).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Exchange email/password for a fresh credential pair.
    pub async fn obtain_token(&self, email: &str, password: &str) -> Result<CredentialPair, AuthError> {
        debug!("Requesting token pair from provider");
        let response = self
            .client
            .post(self.url("user/token"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let pair: TokenPairResponse = Self::check_response(response).await?.json().await?;
        Ok(CredentialPair {
            access: pair.access,
            refresh: pair.refresh,
        })
    }

    /// Exchange a refresh token for a new credential pair.
    pub async fn refresh_token(&self, refresh: &str) -> Result<CredentialPair, AuthError> {
        debug!("Renewing credential pair via refresh token");
        let response = self
            .client
            .post(self.url("user/token/refresh/"))
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await?;

        let pair: TokenPairResponse = Self::check_response(response).await?.json().await?;
        Ok(CredentialPair {
            access: pair.access,
            refresh: pair.refresh,
        })
    }

    /// Create a new account. The provider validates password agreement and
    /// email uniqueness server-side.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        password2: &str,
    ) -> Result<(), AuthError> {
        debug!("Submitting registration to provider");
        let response = self
            .client
            .post(self.url("user/register/"))
            .json(&RegisterRequest {
                full_name,
                email,
                password,
                password2,
            })
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }

    /// Ask the provider to email a password-reset link for `email`.
    pub async fn password_reset_email(&self, email: &str) -> Result<String, AuthError> {
        let response = self
            .client
            .get(self.url(&format!("user/password-reset-email/{email}")))
            .send()
            .await?;

        let body: MessageResponse = Self::check_response(response).await?.json().await?;
        Ok(body.message)
    }

    /// Complete a password reset with the emailed OTP and user reference.
    pub async fn password_change(
        &self,
        otp: &str,
        uuidb64: &str,
        password: &str,
        refresh_token: &str,
    ) -> Result<String, AuthError> {
        let response = self
            .client
            .post(self.url("user/password-change/"))
            .json(&serde_json::json!({
                "otp": otp,
                "uuidb64": uuidb64,
                "password": password,
                "refresh_token": refresh_token,
            }))
            .send()
            .await?;

        let body: MessageResponse = Self::check_response(response).await?.json().await?;
        Ok(body.message)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Check if a response is successful, mapping failures with the body's
    /// detail string if the provider supplied one.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AuthError::from_status(status, &body))
        }
    }
}
