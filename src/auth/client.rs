//! Azure AD HTTP client performing the login handshake

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::auth;
use crate::error::{CapError, Result};
use crate::session::{AccountKind, Context, Environment};

use super::assertion::{build_client_assertion, default_certificate_dir, load_private_key};
use super::claims::TokenClaims;
use super::token::AccessToken;
use super::{Authenticator, TokenGrant};

/// Successful token endpoint response
#[derive(Deserialize, Debug)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub expires_in: Option<u64>,
}

/// Error body returned by AAD endpoints
#[derive(Deserialize, Debug)]
pub(crate) struct AadError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl AadError {
    pub fn describe(&self) -> String {
        match &self.error_description {
            Some(description) => {
                // AAD descriptions carry trace lines after the first one
                let first_line = description.lines().next().unwrap_or_default();
                format!("{}: {}", self.error, first_line)
            }
            None => self.error.clone(),
        }
    }
}

/// AAD numbers are sometimes sent as strings
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

/// Login client for Azure AD v1 endpoints
pub struct AadClient {
    client: Client,
    /// Allow the device code flow for users without a credential
    interactive: bool,
    certificate_dir: PathBuf,
}

impl Default for AadClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AadClient {
    /// Create a new client with connection timeouts
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(auth::REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            interactive: true,
            certificate_dir: default_certificate_dir(),
        }
    }

    /// Enable or disable interactive (device code) logins
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Directory searched for `<THUMBPRINT>.pem` private keys
    pub fn set_certificate_dir(&mut self, dir: PathBuf) {
        self.certificate_dir = dir;
    }

    /// URL of an AAD endpoint for a tenant
    pub(crate) fn endpoint_url(environment: &Environment, tenant: &str, path: &str) -> String {
        format!("{}/{}/{}", environment.authority(), tenant, path)
    }

    /// POST a form and split the reply into success or AAD error
    pub(crate) async fn post_form<T>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<std::result::Result<T, AadError>>
    where
        T: DeserializeOwned,
    {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(encode_form(params))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(Ok(response.json().await?));
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<AadError>(&body) {
            Ok(error) => {
                debug!("AAD returned {} ({})", error.error, status.as_u16());
                Ok(Err(error))
            }
            Err(_) if status.as_u16() == 400 || status.as_u16() == 401 => {
                Err(CapError::Authentication(format!(
                    "identity provider rejected the login (status {})",
                    status.as_u16()
                )))
            }
            Err(_) => Err(CapError::Api {
                status: status.as_u16(),
                message: format!("Failed to call {}", url),
            }),
        }
    }

    /// Request a token, treating every AAD error as a rejected login
    async fn request_token(&self, url: &str, params: &[(&str, &str)]) -> Result<TokenResponse> {
        self.post_form::<TokenResponse>(url, params)
            .await?
            .map_err(|e| CapError::Authentication(e.describe()))
    }

    async fn password_grant(
        &self,
        environment: &Environment,
        username: &str,
        password: &SecretString,
    ) -> Result<TokenResponse> {
        if username.is_empty() {
            return Err(CapError::Authentication(
                "a username is required for password logins".to_string(),
            ));
        }
        let url = Self::endpoint_url(environment, auth::COMMON_TENANT, auth::TOKEN_PATH);
        self.request_token(
            &url,
            &[
                ("grant_type", "password"),
                ("client_id", auth::PUBLIC_CLIENT_ID),
                ("resource", environment.resource()),
                ("username", username),
                ("password", password.expose_secret()),
            ],
        )
        .await
    }

    async fn client_secret_grant(
        &self,
        environment: &Environment,
        tenant: &str,
        client_id: &str,
        secret: &SecretString,
    ) -> Result<TokenResponse> {
        let url = Self::endpoint_url(environment, tenant, auth::TOKEN_PATH);
        self.request_token(
            &url,
            &[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", secret.expose_secret()),
                ("resource", environment.resource()),
            ],
        )
        .await
    }

    async fn certificate_grant(
        &self,
        environment: &Environment,
        tenant: &str,
        client_id: &str,
        thumbprint: &str,
    ) -> Result<TokenResponse> {
        let url = Self::endpoint_url(environment, tenant, auth::TOKEN_PATH);
        let key = load_private_key(&self.certificate_dir, thumbprint)?;
        let assertion = build_client_assertion(client_id, &url, thumbprint, &key)?;
        self.request_token(
            &url,
            &[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_assertion_type", auth::CLIENT_ASSERTION_TYPE),
                ("client_assertion", assertion.as_str()),
                ("resource", environment.resource()),
            ],
        )
        .await
    }
}

#[async_trait]
impl Authenticator for AadClient {
    async fn authenticate(
        &self,
        context: &Context,
        secret: Option<SecretString>,
    ) -> Result<TokenGrant> {
        let account = context.account();
        let environment = context.environment();
        debug!(
            "Logging in {} '{}' to environment '{}'",
            account.kind().label(),
            account.id(),
            environment.name()
        );

        let response = match (account.kind(), secret) {
            (AccountKind::User, Some(password)) => {
                self.password_grant(environment, account.id(), &password)
                    .await?
            }
            (AccountKind::User, None) => self.device_code_login(environment).await?,
            (AccountKind::ServicePrincipalWithPassword { tenant }, Some(secret)) => {
                self.client_secret_grant(environment, tenant, account.id(), &secret)
                    .await?
            }
            (AccountKind::ServicePrincipalWithPassword { .. }, None) => {
                return Err(CapError::Authentication(format!(
                    "no client secret supplied for service principal '{}'",
                    account.id()
                )))
            }
            (AccountKind::ServicePrincipalWithCertificate { tenant, thumbprint }, _) => {
                self.certificate_grant(environment, tenant, account.id(), thumbprint)
                    .await?
            }
        };

        let identity = match account.kind() {
            AccountKind::User => TokenClaims::decode(&response.access_token)
                .and_then(|claims| claims.user_name().map(str::to_string)),
            _ => None,
        };

        let token = AccessToken::expiring_in(
            SecretString::from(response.access_token),
            response.token_type.as_deref().unwrap_or("Bearer"),
            response.expires_in.unwrap_or(3600),
        );

        Ok(TokenGrant { token, identity })
    }
}

/// Encode parameters as `application/x-www-form-urlencoded`
fn encode_form(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
