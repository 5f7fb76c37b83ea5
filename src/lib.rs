//! Tokengate - client-side session core.
//!
//! Manages a pair of bearer credentials (a short-lived access token and a
//! longer-lived refresh token), exposes the authenticated identity to the
//! rest of the application, and silently renews the access token when it
//! expires - coalescing concurrent renewals into one provider call.
//!
//! A typical embedding wires the pieces together once at startup:
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokengate::{Config, IdentityState, RequestGateway, SessionController};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let identity = Arc::new(IdentityState::new());
//! let session = Arc::new(SessionController::new(&config, Arc::clone(&identity))?);
//! let gateway = RequestGateway::new(&config, Arc::clone(&session))?;
//!
//! // The one startup pass; guards must not evaluate routes before this
//! // completes (IdentityState.initializing stays true until it does).
//! session.initialize().await;
//! # Ok(())
//! # }
//! ```
//!
//! Route guards subscribe to [`IdentityState`] and redirect to the login
//! surface whenever the identity is absent.

pub mod api;
pub mod auth;
pub mod claims;
pub mod config;
pub mod gateway;

pub use api::{AuthError, ProviderClient};
pub use auth::{
    CredentialPair, CredentialStore, IdentitySnapshot, IdentityState, Notice, SessionController,
    SessionState,
};
pub use claims::{Claims, DecodeError, Identity};
pub use config::Config;
pub use gateway::RequestGateway;
