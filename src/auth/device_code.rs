//! Device code flow for interactive user logins

use log::{debug, info};
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::config::auth;
use crate::error::{CapError, Result};
use crate::session::Environment;

use super::client::{lenient_u64, AadClient, TokenResponse};

/// Reply of the device code endpoint
#[derive(Deserialize, Debug)]
pub(crate) struct DeviceCode {
    pub user_code: String,
    pub device_code: String,
    #[serde(default, alias = "verification_uri")]
    pub verification_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub expires_in: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub interval: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DeviceCode {
    /// Instructions shown to the user
    pub fn instructions(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => format!(
                "To sign in, open {} and enter the code {}",
                self.verification_url
                    .as_deref()
                    .unwrap_or("https://microsoft.com/devicelogin"),
                self.user_code
            ),
        }
    }
}

impl AadClient {
    /// Sign a user in through the device code flow.
    ///
    /// Prints the sign-in instructions to stderr and polls the token endpoint
    /// until the user completes the login or the code expires.
    pub(crate) async fn device_code_login(
        &self,
        environment: &Environment,
    ) -> Result<TokenResponse> {
        if !self.is_interactive() {
            return Err(CapError::Authentication(
                "interactive login is disabled in batch mode; supply a credential".to_string(),
            ));
        }

        let code_url = Self::endpoint_url(environment, auth::COMMON_TENANT, auth::DEVICE_CODE_PATH);
        let code: DeviceCode = self
            .post_form(
                &code_url,
                &[
                    ("client_id", auth::PUBLIC_CLIENT_ID),
                    ("resource", environment.resource()),
                ],
            )
            .await?
            .map_err(|e| CapError::Authentication(e.describe()))?;

        eprintln!("{}", code.instructions());

        let token_url = Self::endpoint_url(environment, auth::COMMON_TENANT, auth::TOKEN_PATH);
        let deadline = Instant::now() + Duration::from_secs(code.expires_in.unwrap_or(900));
        let mut interval = code.interval.unwrap_or(5);

        loop {
            let reply = self
                .post_form::<TokenResponse>(
                    &token_url,
                    &[
                        ("grant_type", "device_code"),
                        ("client_id", auth::PUBLIC_CLIENT_ID),
                        ("resource", environment.resource()),
                        ("code", code.device_code.as_str()),
                    ],
                )
                .await?;

            match reply {
                Ok(token) => {
                    info!("Device code login completed");
                    return Ok(token);
                }
                Err(e) if e.error == "authorization_pending" => {
                    debug!("Waiting for user to complete sign-in");
                }
                Err(e) if e.error == "slow_down" => {
                    interval += auth::SLOW_DOWN_INCREMENT_SECS;
                    debug!("Identity provider asked to slow down, polling every {}s", interval);
                }
                Err(e) => return Err(CapError::Authentication(e.describe())),
            }

            if Instant::now() >= deadline {
                return Err(CapError::Authentication(
                    "device code expired before sign-in completed".to_string(),
                ));
            }
            tokio::time::sleep(Duration::from_secs(interval)).await;
        }
    }
}
