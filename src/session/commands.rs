//! Session command handlers

use log::{debug, warn};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AadClient, Authenticator};
use crate::cli::{Cli, LoginArgs};
use crate::config::environment as env_config;
use crate::error::{CapError, Result};
use crate::output::{output_context, output_environments, output_login_plan, output_profile};
use crate::ui::{clear_spinner, create_spinner, finish_spinner, prompt_password};

use super::account::{AccountOptions, Credential};
use super::context::{Context, Profile};
use super::environment::EnvironmentRegistry;
use super::manager::{LoginPlan, LoginRequest, SessionManager};
use super::store::{SessionState, SessionStore};

/// Registry honouring the authority override
fn registry_from_env() -> EnvironmentRegistry {
    match std::env::var(env_config::AUTHORITY_ENV_VAR) {
        Ok(authority) if !authority.is_empty() => {
            debug!(
                "Using authority from {} environment variable: {}",
                env_config::AUTHORITY_ENV_VAR,
                authority
            );
            EnvironmentRegistry::with_authority(&authority)
        }
        _ => EnvironmentRegistry::new(),
    }
}

/// Fresh manager seeded with the saved session
fn load_manager<A>(store: &SessionStore, authenticator: A) -> Result<SessionManager<A>> {
    let mut manager = SessionManager::with_registry(registry_from_env(), authenticator);
    store.load()?.restore_into(&mut manager);
    Ok(manager)
}

/// Work out the explicit credential of a login, prompting when allowed.
///
/// The password is moved out of `args`, so the credential holds the only
/// copy. A password without a username belongs to the application id.
fn resolve_credential(args: &mut LoginArgs, batch: bool) -> Result<Option<Credential>> {
    let password = args.password.take();
    let username = match (&args.username, &password) {
        (Some(username), _) => Some(username.clone()),
        (None, Some(_)) => args.application_id.clone(),
        (None, None) => None,
    };

    match (username, password) {
        (Some(username), Some(password)) => Ok(Some(Credential::new(username, password))),
        (Some(username), None) if batch => Err(CapError::Validation(format!(
            "no password supplied for '{}' and batch mode cannot prompt",
            username
        ))),
        (Some(username), None) => {
            let password = prompt_password(&username)?;
            Ok(Some(Credential::new(username, password)))
        }
        (None, Some(_)) => Err(CapError::Validation(
            "--password requires --username or --application-id".to_string(),
        )),
        (None, None) => Ok(None),
    }
}

/// Credential of a dry run: a username alone counts as explicit and
/// nothing is prompted for.
fn planned_credential(args: &mut LoginArgs) -> Result<Option<Credential>> {
    if args.username.is_some() && args.password.is_none() {
        args.password = Some(SecretString::from(""));
    }
    resolve_credential(args, true)
}

fn login_request(args: &LoginArgs, credential: Option<Credential>) -> LoginRequest {
    LoginRequest {
        environment: args.environment.clone(),
        credential,
        options: AccountOptions {
            service_principal: args.service_principal,
            tenant: args.tenant.clone(),
            application_id: args.application_id.clone(),
            certificate_thumbprint: args.certificate_thumbprint.clone(),
        },
    }
}

/// Restore the saved session, log in within `timeout_secs`, save the result.
///
/// The session is saved after failed logins too, so it points at the
/// attempted context; only validation errors leave it alone.
pub async fn run_login<A: Authenticator>(
    store: &SessionStore,
    authenticator: A,
    request: LoginRequest,
    timeout_secs: u64,
) -> Result<Profile> {
    let mut manager = load_manager(store, authenticator)?;

    let outcome = match tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        manager.login(request),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => Err(CapError::Timeout(timeout_secs)),
    };

    if matches!(outcome, Err(CapError::Validation(_))) {
        return outcome;
    }

    if let Err(e) = store.save(&SessionState::capture(&manager)) {
        if outcome.is_ok() {
            return Err(e);
        }
        warn!("Failed to save session after failed login: {}", e);
    }
    outcome
}

/// Report what a login would do against the saved session. Nothing is saved.
pub fn run_login_preview(store: &SessionStore, request: &LoginRequest) -> Result<LoginPlan> {
    load_manager(store, ())?.plan(request)
}

/// Clear the saved current context, returning it
pub fn run_logout(store: &SessionStore) -> Result<Option<Arc<Context>>> {
    let mut manager = load_manager(store, ())?;
    let previous = manager.logout();
    if previous.is_some() {
        store.save(&SessionState::capture(&manager))?;
    }
    Ok(previous)
}

/// Handle 'login'
pub async fn run_login_command(
    cli: &Cli,
    mut args: LoginArgs,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if args.dry_run {
        let credential = planned_credential(&mut args)?;
        let plan = run_login_preview(&SessionStore::new(), &login_request(&args, credential))?;
        output_login_plan(&plan, cli.output);
        return Ok(());
    }

    let credential = resolve_credential(&mut args, cli.batch)?;
    let device_code = credential.is_none() && !args.service_principal;

    let mut client = AadClient::new();
    client.set_interactive(!cli.batch);

    let target = args
        .environment
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(EnvironmentRegistry::default_name())
        .to_string();

    // The device code flow prints instructions, keep the terminal clean for it
    let spinner = if device_code {
        None
    } else {
        create_spinner(&format!("Logging in to {}...", target), cli.batch)
    };

    let store = SessionStore::new();
    let request = login_request(&args, credential);
    match run_login(&store, client, request, args.timeout).await {
        Ok(profile) => {
            finish_spinner(spinner, &format!("✓ Logged in to {}", target));
            output_profile(&profile, cli.output);
            Ok(())
        }
        Err(e) => {
            clear_spinner(spinner);
            Err(e.into())
        }
    }
}

/// Handle 'logout'
pub fn run_logout_command(_cli: &Cli) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let store = SessionStore::new();
    match run_logout(&store)? {
        Some(previous) => println!(
            "✓ Logged out '{}' from '{}'",
            previous.account().id(),
            previous.environment().name()
        ),
        None => println!("No active session."),
    }
    Ok(())
}

/// Handle 'context'
pub fn run_context_command(cli: &Cli) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let manager = load_manager(&SessionStore::new(), ())?;
    output_context(manager.current_context().map(Arc::as_ref), cli.output);
    Ok(())
}

/// Handle 'env'
pub fn run_env_command(cli: &Cli) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let manager = load_manager(&SessionStore::new(), ())?;
    let current = manager
        .current_context()
        .map(|ctx| ctx.environment().name().to_string());
    output_environments(
        manager.registry().iter().map(Arc::as_ref),
        current.as_deref(),
        cli.output,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenGrant;
    use crate::cli::Command;
    use crate::session::manager::ContextDecision;
    use crate::session::manager::tests::{user_request, RecordingAuthenticator};
    use async_trait::async_trait;
    use clap::Parser;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> SessionStore {
        SessionStore::with_path(dir.path().join("session.json"))
    }

    fn args(username: Option<&str>, password: Option<&str>) -> LoginArgs {
        LoginArgs {
            username: username.map(str::to_string),
            password: password.map(SecretString::from),
            ..Default::default()
        }
    }

    struct StalledAuthenticator;

    #[async_trait]
    impl Authenticator for StalledAuthenticator {
        async fn authenticate(
            &self,
            _context: &Context,
            _secret: Option<SecretString>,
        ) -> Result<TokenGrant> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(CapError::Authentication("unreachable".to_string()))
        }
    }

    #[test]
    fn test_resolve_credential_username_and_password() {
        let mut login = args(Some("alice"), Some("pw"));
        let cred = resolve_credential(&mut login, true).unwrap().unwrap();
        assert_eq!(cred.username(), "alice");
        assert_eq!(cred.into_secret().expose_secret(), "pw");
    }

    #[test]
    fn test_resolve_credential_moves_password_out_of_args() {
        let cli = Cli::parse_from(["capctl", "login", "prod", "-u", "alice", "-p", "s3cr3t"]);
        let Command::Login(mut login) = cli.command else {
            panic!("expected login command");
        };

        let cred = resolve_credential(&mut login, true).unwrap().unwrap();
        assert!(login.password.is_none());
        assert!(!format!("{:?}", login).contains("s3cr3t"));
        assert_eq!(cred.into_secret().expose_secret(), "s3cr3t");
    }

    #[test]
    fn test_failed_resolution_still_drops_password() {
        let mut login = args(None, Some("orphan"));
        assert!(resolve_credential(&mut login, true).is_err());
        assert!(login.password.is_none());
    }

    #[test]
    fn test_resolve_credential_none() {
        assert!(resolve_credential(&mut args(None, None), true)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_resolve_credential_password_uses_application_id() {
        let mut login = args(None, Some("sp-secret"));
        login.service_principal = true;
        login.application_id = Some("app-123".to_string());
        let cred = resolve_credential(&mut login, true).unwrap().unwrap();
        assert_eq!(cred.username(), "app-123");
    }

    #[test]
    fn test_resolve_credential_password_without_identity() {
        let err = resolve_credential(&mut args(None, Some("pw")), true).unwrap_err();
        assert!(matches!(err, CapError::Validation(_)));
    }

    #[test]
    fn test_resolve_credential_batch_cannot_prompt() {
        let err = resolve_credential(&mut args(Some("alice"), None), true).unwrap_err();
        assert!(err.to_string().contains("batch mode cannot prompt"));
    }

    #[test]
    fn test_login_request_maps_flags() {
        let mut login = args(None, None);
        login.environment = Some("prod".to_string());
        login.service_principal = true;
        login.tenant = Some("t1".to_string());
        login.certificate_thumbprint = Some("AB".to_string());
        let request = login_request(&login, None);
        assert_eq!(request.environment.as_deref(), Some("prod"));
        assert!(request.options.service_principal);
        assert_eq!(request.options.tenant.as_deref(), Some("t1"));
        assert_eq!(request.options.certificate_thumbprint.as_deref(), Some("AB"));
    }

    #[tokio::test]
    async fn test_run_login_saves_context() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let profile = run_login(
            &store,
            RecordingAuthenticator::default(),
            user_request("prod", Some("alice")),
            30,
        )
        .await
        .unwrap();
        assert_eq!(profile.context().account().id(), "alice");

        let state = store.load().unwrap();
        let stored = state.current_context.unwrap();
        assert_eq!(stored.account.id(), "alice");
        assert_eq!(stored.environment, "prod");
        assert!(state.environments.contains_key("prod"));
    }

    #[tokio::test]
    async fn test_run_login_reuses_saved_context() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        run_login(
            &store,
            RecordingAuthenticator::default(),
            user_request("prod", Some("alice")),
            30,
        )
        .await
        .unwrap();

        let authenticator = RecordingAuthenticator::default();
        let mut manager = load_manager(&store, authenticator).unwrap();
        let before = Arc::clone(manager.current_context().unwrap());
        manager.login(user_request("prod", Some("alice"))).await.unwrap();
        assert!(Arc::ptr_eq(&before, manager.current_context().unwrap()));
    }

    #[tokio::test]
    async fn test_run_login_failure_saves_attempted_context() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        run_login(
            &store,
            RecordingAuthenticator::default(),
            user_request("prod", Some("alice")),
            30,
        )
        .await
        .unwrap();

        let rejecting = RecordingAuthenticator {
            reject: true,
            ..Default::default()
        };
        let err = run_login(&store, rejecting, user_request("dev", Some("bob")), 30)
            .await
            .unwrap_err();
        assert!(matches!(err, CapError::Authentication(_)));

        let stored = store.load().unwrap().current_context.unwrap();
        assert_eq!(stored.account.id(), "bob");
        assert_eq!(stored.environment, "dev");
    }

    #[tokio::test]
    async fn test_run_login_validation_error_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let request = LoginRequest {
            environment: Some("prod".to_string()),
            credential: None,
            options: AccountOptions {
                service_principal: true,
                tenant: Some(String::new()),
                ..Default::default()
            },
        };
        let err = run_login(&store, RecordingAuthenticator::default(), request, 30)
            .await
            .unwrap_err();

        assert!(matches!(err, CapError::Validation(_)));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_run_login_timeout_keeps_replaced_context() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let err = run_login(&store, StalledAuthenticator, user_request("prod", Some("alice")), 0)
            .await
            .unwrap_err();

        assert!(matches!(err, CapError::Timeout(0)));
        let stored = store.load().unwrap().current_context.unwrap();
        assert_eq!(stored.account.id(), "alice");
    }

    #[test]
    fn test_planned_credential_never_prompts() {
        let mut login = args(Some("alice"), None);
        let cred = planned_credential(&mut login).unwrap().unwrap();
        assert_eq!(cred.username(), "alice");
        assert!(login.password.is_none());
        assert!(planned_credential(&mut args(None, None)).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_preview_leaves_session_file_alone() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let plan = run_login_preview(&store, &user_request("prod", Some("alice"))).unwrap();
        assert_eq!(plan.decision, ContextDecision::Replace);
        assert!(plan.new_environment);
        assert!(!store.path().exists());

        run_login(
            &store,
            RecordingAuthenticator::default(),
            user_request("prod", Some("alice")),
            30,
        )
        .await
        .unwrap();
        let saved = std::fs::read_to_string(store.path()).unwrap();

        let plan = run_login_preview(&store, &user_request("prod", Some("alice"))).unwrap();
        assert_eq!(plan.decision, ContextDecision::Reuse);
        let plan = run_login_preview(&store, &user_request("dev", Some("alice"))).unwrap();
        assert_eq!(plan.decision, ContextDecision::Replace);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), saved);
    }

    #[tokio::test]
    async fn test_run_logout() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        assert!(run_logout(&store).unwrap().is_none());

        run_login(
            &store,
            RecordingAuthenticator::default(),
            user_request("prod", Some("alice")),
            30,
        )
        .await
        .unwrap();

        let previous = run_logout(&store).unwrap().unwrap();
        assert_eq!(previous.account().id(), "alice");

        let state = store.load().unwrap();
        assert!(state.current_context.is_none());
        assert!(state.environments.contains_key("prod"));
    }
}
