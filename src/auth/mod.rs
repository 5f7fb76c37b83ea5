//! Authentication module for managing the credential lifecycle.
//!
//! This module provides:
//! - `CredentialStore`: file-backed storage of the access/refresh pair
//! - `IdentityState`: observable current-identity state for guards and UI
//! - `SessionController`: login, registration, logout, and silent renewal

pub mod credentials;
pub mod identity;
pub mod session;

pub use credentials::{CredentialPair, CredentialStore};
pub use identity::{IdentitySnapshot, IdentityState};
pub use session::{Notice, SessionController, SessionState};
