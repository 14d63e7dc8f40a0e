//! Login command arguments

use clap::Parser;
use secrecy::SecretString;

use crate::config::{defaults, environment};

/// Arguments for 'login' subcommand
#[derive(Parser, Debug, Default)]
#[command(after_help = "EXAMPLES:\n  \
        capctl login                                     # device code sign-in, default environment\n  \
        capctl login westeurope.pbidedicated.windows.net -u alice@contoso.com\n  \
        capctl login prod --service-principal --tenant contoso.onmicrosoft.com \\\n      \
            --application-id <APP_ID> -p <SECRET>\n  \
        capctl login prod --service-principal --tenant <TENANT> \\\n      \
            --application-id <APP_ID> --certificate-thumbprint <THUMBPRINT>")]
pub struct LoginArgs {
    /// Environment to log into (defaults to the public capacity environment)
    #[arg(env = environment::ENV_VAR)]
    pub environment: Option<String>,

    /// User name of the credential
    #[arg(short, long, env = "CAPCTL_USERNAME")]
    pub username: Option<String>,

    /// Password or client secret of the credential (prompted when omitted)
    #[arg(
        short,
        long,
        env = "CAPCTL_PASSWORD",
        hide_env_values = true,
        value_parser = parse_secret
    )]
    pub password: Option<SecretString>,

    /// Log in as a service principal
    #[arg(long, default_value_t = false)]
    pub service_principal: bool,

    /// Tenant name or ID (service principals)
    #[arg(long, requires = "service_principal")]
    pub tenant: Option<String>,

    /// Application ID (service principals)
    #[arg(long, requires = "service_principal")]
    pub application_id: Option<String>,

    /// Certificate hash (thumbprint) (service principals)
    #[arg(long, requires = "application_id", conflicts_with_all = ["username", "password"])]
    pub certificate_thumbprint: Option<String>,

    /// Seconds to wait for the login to complete
    #[arg(long, default_value_t = defaults::LOGIN_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Show whether the current context would be reused or replaced, without logging in
    #[arg(long, visible_alias = "what-if", default_value_t = false)]
    pub dry_run: bool,
}

fn parse_secret(value: &str) -> Result<SecretString, String> {
    Ok(SecretString::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[derive(Parser, Debug)]
    struct Wrapper {
        #[command(flatten)]
        args: LoginArgs,
    }

    fn parse(args: &[&str]) -> Result<LoginArgs, clap::Error> {
        let mut argv = vec!["login"];
        argv.extend_from_slice(args);
        Wrapper::try_parse_from(argv).map(|w| w.args)
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert!(!args.service_principal);
        assert!(args.tenant.is_none());
        assert!(args.certificate_thumbprint.is_none());
        assert_eq!(args.timeout, defaults::LOGIN_TIMEOUT_SECS);
    }

    #[test]
    fn test_user_credential() {
        let args = parse(&["prod", "-u", "alice", "-p", "pw"]).unwrap();
        assert_eq!(args.environment.as_deref(), Some("prod"));
        assert_eq!(args.username.as_deref(), Some("alice"));
        assert_eq!(
            args.password.as_ref().map(|p| p.expose_secret()),
            Some("pw")
        );
    }

    #[test]
    fn test_tenant_requires_service_principal() {
        assert!(parse(&["--tenant", "t1"]).is_err());
    }

    #[test]
    fn test_thumbprint_requires_application_id() {
        assert!(parse(&["--service-principal", "--tenant", "t1", "--certificate-thumbprint", "AB"])
            .is_err());
    }

    #[test]
    fn test_thumbprint_conflicts_with_username() {
        let result = parse(&[
            "--service-principal",
            "--tenant",
            "t1",
            "--application-id",
            "app",
            "--certificate-thumbprint",
            "AB",
            "-u",
            "someone",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_certificate_login() {
        let args = parse(&[
            "prod",
            "--service-principal",
            "--tenant",
            "t1",
            "--application-id",
            "app",
            "--certificate-thumbprint",
            "AB",
        ])
        .unwrap();
        assert!(args.service_principal);
        assert_eq!(args.certificate_thumbprint.as_deref(), Some("AB"));
    }

    #[test]
    fn test_password_is_not_printed_by_debug() {
        let args = parse(&["-u", "alice", "-p", "s3cr3t"]).unwrap();
        assert!(!format!("{:?}", args).contains("s3cr3t"));
    }

    #[test]
    fn test_dry_run_flag() {
        assert!(!parse(&[]).unwrap().dry_run);
        assert!(parse(&["--dry-run"]).unwrap().dry_run);
        assert!(parse(&["--what-if"]).unwrap().dry_run);
    }
}
