//! Profile and context output formatters

use chrono::{DateTime, Utc};
use comfy_table::{presets::NOTHING, Table};
use serde::Serialize;

use super::common::{or_not_set, print_json, print_yaml};
use crate::cli::OutputFormat;
use crate::session::{Context, Profile};

/// Serializable context for structured output (JSON/YAML)
#[derive(Serialize, Debug)]
pub(crate) struct SerializableContext {
    environment: String,
    endpoint: String,
    account: String,
    account_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant: Option<String>,
}

impl From<&Context> for SerializableContext {
    fn from(ctx: &Context) -> Self {
        Self {
            environment: ctx.environment().name().to_string(),
            endpoint: ctx.environment().endpoint().to_string(),
            account: ctx.account().id().to_string(),
            account_type: ctx.account().kind().label().to_string(),
            tenant: ctx.account().tenant().map(str::to_string),
        }
    }
}

/// Serializable profile; the token is always masked
#[derive(Serialize, Debug)]
pub(crate) struct SerializableProfile {
    #[serde(flatten)]
    context: SerializableContext,
    token: String,
    token_type: String,
    expires_on: DateTime<Utc>,
}

impl From<&Profile> for SerializableProfile {
    fn from(profile: &Profile) -> Self {
        Self {
            context: profile.context().as_ref().into(),
            token: profile.token().masked(),
            token_type: profile.token().token_type().to_string(),
            expires_on: profile.token().expires_on(),
        }
    }
}

/// Output a login profile in the specified format
pub fn output_profile(profile: &Profile, format: OutputFormat) {
    let data = SerializableProfile::from(profile);
    match format {
        OutputFormat::Table => {
            let mut table = context_table(&data.context);
            let expires = data.expires_on.to_rfc3339();
            table.add_row(vec!["Token", data.token.as_str()]);
            table.add_row(vec!["Expires", expires.as_str()]);
            println!("{table}");
        }
        OutputFormat::Json => print_json(&data),
        OutputFormat::Yaml => print_yaml(&data),
    }
}

/// Output the current context, or a hint when there is none
pub fn output_context(context: Option<&Context>, format: OutputFormat) {
    let Some(context) = context else {
        match format {
            OutputFormat::Table => {
                println!("No active session.");
                println!("\nUse 'capctl login' to sign in.");
            }
            OutputFormat::Json => println!("null"),
            OutputFormat::Yaml => println!("null"),
        }
        return;
    };

    let data = SerializableContext::from(context);
    match format {
        OutputFormat::Table => println!("{}", context_table(&data)),
        OutputFormat::Json => print_json(&data),
        OutputFormat::Yaml => print_yaml(&data),
    }
}

fn context_table(data: &SerializableContext) -> Table {
    let account = if data.account.is_empty() {
        "<interactive>"
    } else {
        data.account.as_str()
    };
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.add_row(vec!["Environment", data.environment.as_str()]);
    table.add_row(vec!["Endpoint", data.endpoint.as_str()]);
    table.add_row(vec!["Account", account]);
    table.add_row(vec!["Type", data.account_type.as_str()]);
    table.add_row(vec!["Tenant", or_not_set(data.tenant.as_deref())]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AccessToken;
    use crate::session::{Account, Environment};
    use secrecy::SecretString;
    use std::sync::Arc;

    fn profile() -> Profile {
        let env = Arc::new(Environment::new("prod", "https://login.example"));
        let ctx = Arc::new(Context::new(Account::user("alice@contoso.com"), env));
        let token = AccessToken::expiring_in(
            SecretString::from("eyJ0eXAi.secret-part-9876".to_string()),
            "Bearer",
            3600,
        );
        Profile::new(ctx, token)
    }

    #[test]
    fn test_serializable_profile_masks_token() {
        let data = SerializableProfile::from(&profile());
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["token"], "****9876");
        assert_eq!(json["environment"], "prod");
        assert_eq!(json["endpoint"], "https://prod");
        assert_eq!(json["account"], "alice@contoso.com");
        assert_eq!(json["account_type"], "User");
        assert!(json.get("tenant").is_none());
        assert!(!json.to_string().contains("secret-part"));
    }

    #[test]
    fn test_context_table_marks_interactive_account() {
        let env = Arc::new(Environment::new("prod", "https://login.example"));
        let ctx = Context::new(Account::user(""), env);
        let table = context_table(&SerializableContext::from(&ctx)).to_string();
        assert!(table.contains("<interactive>"));
        assert!(table.contains("<not set>"));
    }

    #[test]
    fn test_output_context_none_does_not_panic() {
        output_context(None, OutputFormat::Table);
        output_context(None, OutputFormat::Json);
    }
}
