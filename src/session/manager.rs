//! Session manager: one active context, reused or replaced per login

use log::{debug, info, warn};
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::error::Result;

use super::account::{Account, AccountOptions, Credential};
use super::context::{Context, Profile};
use super::environment::{Environment, EnvironmentRegistry};

/// Outcome of comparing the current context with a login request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextDecision {
    /// Keep the current context as it is
    Reuse,
    /// Build a new context and discard the current one
    Replace,
}

/// Decide whether a login may keep the current context.
///
/// Reuse requires an explicit credential, a current context with a non-empty
/// account id equal to the requested one, and the same environment name.
pub fn decide_context(
    current: Option<&Context>,
    account: &Account,
    environment: &Environment,
    explicit_credential: bool,
) -> ContextDecision {
    match current {
        Some(current)
            if explicit_credential
                && !current.account().id().is_empty()
                && current.account().id() == account.id()
                && current.environment().name() == environment.name() =>
        {
            ContextDecision::Reuse
        }
        _ => ContextDecision::Replace,
    }
}

impl ContextDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextDecision::Reuse => "reuse",
            ContextDecision::Replace => "replace",
        }
    }
}

/// What a login would do, computed without touching the session
#[derive(Debug)]
pub struct LoginPlan {
    pub decision: ContextDecision,
    pub account: Account,
    pub environment: Arc<Environment>,
    /// The environment would be provisioned by the login
    pub new_environment: bool,
    /// Context discarded by a replacement
    pub replaces: Option<Arc<Context>>,
}

/// Everything a caller supplies for one login
#[derive(Debug, Default)]
pub struct LoginRequest {
    /// Environment name; empty or `None` selects the default environment
    pub environment: Option<String>,
    pub credential: Option<Credential>,
    pub options: AccountOptions,
}

/// Caller-owned session state: the environment registry and at most one
/// current context.
pub struct SessionManager<A> {
    registry: EnvironmentRegistry,
    current: Option<Arc<Context>>,
    authenticator: A,
}

/// A session manager shared between tasks; the lock covers the whole
/// read-decide-write of a login.
pub type SharedSession<A> = Arc<tokio::sync::Mutex<SessionManager<A>>>;

impl<A> SessionManager<A> {
    /// Fresh session with the default registry and no context
    pub fn new(authenticator: A) -> Self {
        Self::with_registry(EnvironmentRegistry::new(), authenticator)
    }

    pub fn with_registry(registry: EnvironmentRegistry, authenticator: A) -> Self {
        Self {
            registry,
            current: None,
            authenticator,
        }
    }

    pub fn registry(&self) -> &EnvironmentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EnvironmentRegistry {
        &mut self.registry
    }

    pub fn current_context(&self) -> Option<&Arc<Context>> {
        self.current.as_ref()
    }

    /// Install a previously saved context without logging in
    pub fn restore(&mut self, context: Context) {
        debug!(
            "Restored context '{}' on '{}'",
            context.account().id(),
            context.environment().name()
        );
        self.current = Some(Arc::new(context));
    }

    /// Drop the current context, returning it
    pub fn logout(&mut self) -> Option<Arc<Context>> {
        self.current.take()
    }

    /// Validate a request and report the context decision a login would
    /// make. Neither the registry nor the current context change.
    pub fn plan(&self, request: &LoginRequest) -> Result<LoginPlan> {
        let account = Account::from_credential(request.credential.as_ref(), &request.options)?;
        let (environment, new_environment) = self.registry.lookup(request.environment.as_deref());
        let decision = decide_context(
            self.current.as_deref(),
            &account,
            &environment,
            request.credential.is_some(),
        );
        let replaces = match decision {
            ContextDecision::Replace => self.current.clone(),
            ContextDecision::Reuse => None,
        };

        Ok(LoginPlan {
            decision,
            account,
            environment,
            new_environment,
            replaces,
        })
    }

    pub fn into_shared(self) -> SharedSession<A> {
        Arc::new(tokio::sync::Mutex::new(self))
    }
}

impl<A: Authenticator> SessionManager<A> {
    /// Log in, reusing or replacing the current context.
    ///
    /// Validation errors leave the session untouched. A replaced context stays
    /// current even when the handshake fails afterwards.
    pub async fn login(&mut self, request: LoginRequest) -> Result<Profile> {
        let LoginRequest {
            environment,
            credential,
            options,
        } = request;

        let account = Account::from_credential(credential.as_ref(), &options)?;
        let explicit_credential = credential.is_some();
        let secret = credential.map(Credential::into_secret);

        let environment = self.registry.resolve(environment.as_deref());
        let decision = decide_context(
            self.current.as_deref(),
            &account,
            &environment,
            explicit_credential,
        );

        let reused = match decision {
            ContextDecision::Reuse => self.current.clone(),
            ContextDecision::Replace => None,
        };

        let context = match reused {
            Some(current) => {
                debug!(
                    "Reusing context '{}' on '{}'",
                    current.account().id(),
                    environment.name()
                );
                current
            }
            None => {
                debug!(
                    "Replacing context with '{}' on '{}'",
                    account.id(),
                    environment.name()
                );
                let context = Arc::new(Context::new(account, environment));
                self.current = Some(Arc::clone(&context));
                context
            }
        };

        let grant = match self.authenticator.authenticate(&context, secret).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(
                    "Login to '{}' failed; session now points at the unauthenticated context",
                    context.environment().name()
                );
                return Err(e);
            }
        };

        let context = match grant.identity {
            Some(identity) if context.account().id().is_empty() => {
                debug!("Signed-in identity resolved to '{}'", identity);
                let updated = Arc::new(context.with_account_id(&identity));
                self.current = Some(Arc::clone(&updated));
                updated
            }
            _ => context,
        };

        info!(
            "Logged in as '{}' to '{}'",
            context.account().id(),
            context.environment().name()
        );
        Ok(Profile::new(context, grant.token))
    }
}
