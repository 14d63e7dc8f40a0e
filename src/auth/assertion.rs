//! Signed client assertions for certificate-based service principals

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::auth;
use crate::error::{CapError, Result};

#[derive(Serialize, Debug)]
struct AssertionClaims<'a> {
    aud: &'a str,
    iss: &'a str,
    sub: &'a str,
    jti: String,
    nbf: i64,
    exp: i64,
}

/// Default directory holding `<THUMBPRINT>.pem` private keys
pub fn default_certificate_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(auth::CERTIFICATE_DIR_ENV_VAR) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(auth::CERTIFICATE_DIR)
}

/// Read the private key PEM for a certificate thumbprint
pub fn load_private_key(dir: &Path, thumbprint: &str) -> Result<Vec<u8>> {
    let path = dir.join(format!("{}.pem", thumbprint));
    debug!("Loading certificate key from {}", path.display());
    fs::read(&path).map_err(|e| {
        CapError::Config(format!(
            "Failed to read private key for certificate {} at {}: {}",
            thumbprint,
            path.display(),
            e
        ))
    })
}

/// Build an RS256 client assertion addressed to `token_url`.
///
/// The `x5t` header carries the base64url encoded SHA-1 thumbprint so the
/// identity provider can match the registered certificate.
pub fn build_client_assertion(
    client_id: &str,
    token_url: &str,
    thumbprint: &str,
    key_pem: &[u8],
) -> Result<String> {
    let digest = hex::decode(thumbprint).map_err(|e| {
        CapError::Config(format!(
            "Certificate thumbprint '{}' is not valid hex: {}",
            thumbprint, e
        ))
    })?;

    let mut header = Header::new(Algorithm::RS256);
    header.x5t = Some(URL_SAFE_NO_PAD.encode(digest));

    let key = EncodingKey::from_rsa_pem(key_pem).map_err(|e| {
        CapError::Config(format!(
            "Invalid private key for certificate {}: {}",
            thumbprint, e
        ))
    })?;

    let now = Utc::now().timestamp();
    let claims = AssertionClaims {
        aud: token_url,
        iss: client_id,
        sub: client_id,
        jti: uuid::Uuid::new_v4().to_string(),
        nbf: now,
        exp: now + auth::ASSERTION_LIFETIME_SECS,
    };

    encode(&header, &claims, &key)
        .map_err(|e| CapError::Config(format!("Failed to sign client assertion: {}", e)))
}
