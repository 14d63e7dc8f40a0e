//! Identity claims carried in AAD access tokens

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

/// Subset of access token claims used to identify the signed-in user
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct TokenClaims {
    pub upn: Option<String>,
    pub unique_name: Option<String>,
}

impl TokenClaims {
    /// Read the claims of a JWT without verifying its signature.
    ///
    /// The token comes straight from the token endpoint over TLS; only the
    /// payload is of interest. Returns `None` for opaque (non-JWT) tokens.
    pub fn decode(token: &str) -> Option<Self> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Self>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .ok()
    }

    /// Sign-in name of a user principal
    pub fn user_name(&self) -> Option<&str> {
        self.upn
            .as_deref()
            .or(self.unique_name.as_deref())
            .filter(|n| !n.is_empty())
    }
}
