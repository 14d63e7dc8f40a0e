//! Interactive prompts

use dialoguer::{theme::ColorfulTheme, Password};
use secrecy::SecretString;

use crate::error::{CapError, Result};

/// Ask for the password of `username` without echoing it
pub fn prompt_password(username: &str) -> Result<SecretString> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Password for {}", username))
        .interact()
        .map(SecretString::from)
        .map_err(|e| CapError::Config(format!("Failed to read password: {}", e)))
}
