//! Session controller: the owner of the credential lifecycle.
//!
//! This module provides:
//! - `SessionController`: login, registration, logout, silent renewal,
//!   and the password-reset pass-throughs
//! - `SessionState`: on-demand classification of the stored credentials
//! - `Notice`: user-visible events published for UI surfaces to display
//!
//! The controller is the only writer of `CredentialStore` and
//! `IdentityState`; everything else reads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::api::{AuthError, ProviderClient};
use crate::claims::{self, Identity};
use crate::config::Config;

use super::credentials::{CredentialPair, CredentialStore};
use super::identity::IdentityState;

/// Capacity of the notice channel; notices are display hints, dropping
/// the oldest under a slow subscriber is fine
const NOTICE_CHANNEL_CAPACITY: usize = 16;

/// Classification of the stored credentials, computed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing stored; calls go out anonymously
    NoCredentials,
    /// Access token present and not expired
    Fresh,
    /// Access token expired (or its storage entry lapsed) but a refresh
    /// token is available
    Renewable,
    /// Access token expired with no refresh token to renew it; the only
    /// exit is a full logout
    Invalid,
}

/// User-visible session events, for UI surfaces to render as they see fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    LoginSucceeded,
    RegistrationSucceeded,
    LoggedOut,
    AuthFailed(String),
}

pub struct SessionController {
    provider: ProviderClient,
    store: CredentialStore,
    identity: Arc<IdentityState>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    /// Serializes renewal so one expired-credential episode produces at
    /// most one provider call (see `ensure_fresh`)
    renewal_lock: Mutex<()>,
    initialized: AtomicBool,
    notices: broadcast::Sender<Notice>,
}

impl SessionController {
    pub fn new(config: &Config, identity: Arc<IdentityState>) -> anyhow::Result<Self> {
        let provider = ProviderClient::new(&config.provider_base_url, config.request_timeout())?;
        let store = CredentialStore::new(config.data_dir()?);
        let (notices, _rx) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);

        Ok(Self {
            provider,
            store,
            identity,
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
            renewal_lock: Mutex::new(()),
            initialized: AtomicBool::new(false),
            notices,
        })
    }

    /// Subscribe to user-visible session events.
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Handle to the observable identity state.
    pub fn identity_state(&self) -> &Arc<IdentityState> {
        &self.identity
    }

    /// Read-only access to the stored credentials.
    pub fn credentials(&self) -> Option<CredentialPair> {
        self.store.get()
    }

    /// Classify the stored credentials right now.
    pub fn session_state(&self) -> SessionState {
        let now = Utc::now().timestamp();
        let access = self.store.access_token();
        let refresh = self.store.refresh_token();

        match (access, refresh) {
            // Decodable and unexpired; refresh presence is irrelevant
            (Some(access), _) if !claims::is_expired(&access, now) => SessionState::Fresh,
            (_, Some(_)) => SessionState::Renewable,
            (Some(_), None) => SessionState::Invalid,
            (None, None) => SessionState::NoCredentials,
        }
    }

    /// The one-time startup pass.
    ///
    /// Renews the stored credentials if they are stale, projects a
    /// still-valid access token into `IdentityState`, and flips the
    /// `initializing` flag so guards may start evaluating routes. Renewal
    /// failure here is silent - the user simply comes up logged out.
    /// Subsequent calls are no-ops.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Err(e) = self.ensure_fresh().await {
            debug!(error = %e, "Startup renewal failed, starting logged out");
        }

        if let Some(pair) = self.store.get() {
            match claims::decode(&pair.access) {
                Ok(c) if c.exp >= Utc::now().timestamp() => {
                    self.identity.set_identity(c.identity());
                }
                _ => {}
            }
        }

        self.identity.finish_initializing();
        info!(logged_in = self.identity.is_logged_in(), "Session initialized");
    }

    /// Authenticate with the provider and establish a session.
    ///
    /// On failure nothing is stored and any pre-existing session is left
    /// untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let outcome = match self.provider.obtain_token(email, password).await {
            Ok(pair) => self.accept_pair(&pair),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(identity) => {
                info!(user_id = identity.user_id, "Login successful");
                self.notify(Notice::LoginSucceeded);
                Ok(identity)
            }
            Err(e) => {
                self.notify(Notice::AuthFailed(e.detail()));
                Err(e)
            }
        }
    }

    /// Create an account, then log straight in with the same credentials.
    ///
    /// Registration rejections (duplicate email, server-side password
    /// mismatch) are returned as-is with no login attempt.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        password2: &str,
    ) -> Result<Identity, AuthError> {
        if let Err(e) = self.provider.register(full_name, email, password, password2).await {
            self.notify(Notice::AuthFailed(e.detail()));
            return Err(e);
        }

        let identity = self.login(email, password).await?;
        self.notify(Notice::RegistrationSucceeded);
        Ok(identity)
    }

    /// Make sure the stored access token is usable before an outgoing call.
    ///
    /// Anonymous (nothing stored) and fresh sessions return immediately.
    /// An expired access token triggers one renewal against the provider;
    /// concurrent callers queue on the renewal lock and observe the
    /// winner's outcome instead of issuing their own provider call. Any
    /// renewal failure clears the session before surfacing
    /// `SessionInvalidated`.
    pub async fn ensure_fresh(&self) -> Result<(), AuthError> {
        match self.session_state() {
            SessionState::NoCredentials | SessionState::Fresh => return Ok(()),
            SessionState::Renewable | SessionState::Invalid => {}
        }

        let _guard = self.renewal_lock.lock().await;

        // Re-classify: while we waited, another caller may have completed
        // (or failed) this episode's renewal.
        match self.session_state() {
            SessionState::Fresh => Ok(()),
            SessionState::Renewable => self.renew().await,
            SessionState::Invalid => {
                warn!("Access token expired with no refresh token available");
                self.invalidate();
                Err(AuthError::SessionInvalidated)
            }
            // The renewal we queued behind failed and logged us out
            SessionState::NoCredentials => Err(AuthError::SessionInvalidated),
        }
    }

    /// Exchange the refresh token for a new pair. Caller holds the
    /// renewal lock.
    async fn renew(&self) -> Result<(), AuthError> {
        let Some(refresh) = self.store.refresh_token() else {
            self.invalidate();
            return Err(AuthError::SessionInvalidated);
        };

        match self.provider.refresh_token(&refresh).await {
            Ok(pair) => match self.accept_pair(&pair) {
                Ok(identity) => {
                    debug!(user_id = identity.user_id, "Credential renewal succeeded");
                    Ok(())
                }
                Err(e) => {
                    // A pair we cannot decode or persist is a pair we
                    // cannot trust
                    warn!(error = %e, "Renewed credentials rejected, logging out");
                    self.invalidate();
                    Err(AuthError::SessionInvalidated)
                }
            },
            Err(e) => {
                warn!(error = %e, "Credential renewal failed, logging out");
                self.invalidate();
                Err(AuthError::SessionInvalidated)
            }
        }
    }

    /// Drop the session. Idempotent, and always succeeds from the
    /// caller's point of view.
    pub fn logout(&self) {
        self.invalidate();
        self.notify(Notice::LoggedOut);
        info!("Logged out");
    }

    /// Ask the provider to send a password-reset email.
    pub async fn request_password_reset(&self, email: &str) -> Result<String, AuthError> {
        self.provider.password_reset_email(email).await
    }

    /// Complete a password reset. The confirmation mismatch is caught
    /// locally before any network call.
    pub async fn set_new_password(
        &self,
        otp: &str,
        uuidb64: &str,
        new_password: &str,
        confirm_password: &str,
        refresh_token: &str,
    ) -> Result<String, AuthError> {
        if new_password != confirm_password {
            return Err(AuthError::Validation("Passwords do not match".to_string()));
        }

        self.provider
            .password_change(otp, uuidb64, new_password, refresh_token)
            .await
    }

    /// Accept a new credential pair: decode, persist, publish identity.
    ///
    /// The identity write happens immediately after the store write, with
    /// no await between them, so readers never see one without the other.
    fn accept_pair(&self, pair: &CredentialPair) -> Result<Identity, AuthError> {
        let claims = claims::decode(&pair.access)?;
        self.store.set(pair, self.access_ttl, self.refresh_ttl)?;
        let identity = claims.identity();
        self.identity.set_identity(identity.clone());
        Ok(identity)
    }

    /// Clear store and identity together. Store errors are logged, not
    /// surfaced - logout must never fail.
    fn invalidate(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear credential store");
        }
        self.identity.clear();
    }

    fn notify(&self, notice: Notice) {
        // No subscribers is fine
        let _ = self.notices.send(notice);
    }
}
