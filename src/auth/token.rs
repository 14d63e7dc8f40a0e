//! Access tokens returned by the identity provider

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};

/// Bearer token issued for a capacity environment
#[derive(Debug)]
pub struct AccessToken {
    value: SecretString,
    token_type: String,
    expires_on: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: SecretString, token_type: &str, expires_on: DateTime<Utc>) -> Self {
        Self {
            value,
            token_type: token_type.to_string(),
            expires_on,
        }
    }

    /// Token valid for `expires_in` seconds from now
    pub fn expiring_in(value: SecretString, token_type: &str, expires_in: u64) -> Self {
        let lifetime = Duration::seconds(expires_in.min(u64::from(u32::MAX)) as i64);
        Self::new(value, token_type, Utc::now() + lifetime)
    }

    pub fn secret(&self) -> &SecretString {
        &self.value
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_on(&self) -> DateTime<Utc> {
        self.expires_on
    }

    pub fn is_expired(&self) -> bool {
        self.expires_on <= Utc::now()
    }

    /// Last four characters prefixed with asterisks
    pub fn masked(&self) -> String {
        let value = self.value.expose_secret();
        let chars: Vec<char> = value.chars().collect();
        if chars.len() >= 4 {
            format!("****{}", chars[chars.len() - 4..].iter().collect::<String>())
        } else {
            "****".to_string()
        }
    }
}
