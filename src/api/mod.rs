//! Identity-provider API module.
//!
//! `ProviderClient` speaks the provider's token, registration, and
//! password-reset endpoints; `AuthError` is the error taxonomy shared by
//! the whole session core.

pub mod client;
pub mod error;

pub use client::{ProviderClient, REQUEST_TIMEOUT_SECS};
pub use error::{AuthError, GENERIC_ERROR_DETAIL};
