//! Authenticated wrapper around outgoing application calls.
//!
//! Every request first asks the session controller to make sure the
//! access token is fresh, then attaches it as a bearer header. When the
//! session cannot be made fresh the call still goes out, just anonymously;
//! the backend's own 401 is then the caller's problem, not ours.

use std::sync::Arc;

use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::api::AuthError;
use crate::auth::SessionController;
use crate::config::Config;

/// Gateway for calls to the application's own backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct RequestGateway {
    client: Client,
    base_url: String,
    session: Arc<SessionController>,
}

impl RequestGateway {
    pub fn new(config: &Config, session: Arc<SessionController>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    /// GET a JSON resource from the backend.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AuthError> {
        let request = self.client.get(self.url(path));
        self.dispatch(request).await
    }

    /// POST a JSON body to the backend.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AuthError> {
        let request = self.client.post(self.url(path)).json(body);
        self.dispatch(request).await
    }

    /// Run the auth-refresh stage, attach the bearer header, send.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, AuthError> {
        let request = match self.session.ensure_fresh().await {
            Ok(()) => match self.session.credentials() {
                Some(pair) => request.header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", pair.access),
                ),
                // Anonymous session
                None => request,
            },
            Err(e) => {
                // The session was just torn down; let the call proceed
                // unauthenticated and the backend answer for itself
                debug!(error = %e, "Dispatching without credentials");
                request
            }
        };

        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AuthError::from_status(status, &body))
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
