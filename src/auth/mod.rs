//! Login handshake against the identity provider
//!
//! The session manager only depends on the [`Authenticator`] trait; the
//! production implementation is [`AadClient`].

mod assertion;
mod claims;
mod client;
mod device_code;
mod token;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::Result;
use crate::session::Context;

pub use assertion::{build_client_assertion, default_certificate_dir, load_private_key};
pub use claims::TokenClaims;
pub use client::AadClient;
pub use token::AccessToken;

/// Outcome of a successful login handshake
#[derive(Debug)]
pub struct TokenGrant {
    pub token: AccessToken,
    /// Sign-in name learned from the token, if any
    pub identity: Option<String>,
}

/// Remote login operation
///
/// The secret is moved in and dropped (zeroized) when the call returns,
/// whatever the outcome.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(
        &self,
        context: &Context,
        secret: Option<SecretString>,
    ) -> Result<TokenGrant>;
}
