//! Session context and login profile

use std::sync::Arc;

use crate::auth::AccessToken;

use super::account::Account;
use super::environment::Environment;

/// Who is logged in, against which environment.
///
/// Immutable: switching account or environment means building a new context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    account: Account,
    environment: Arc<Environment>,
}

impl Context {
    pub fn new(account: Account, environment: Arc<Environment>) -> Self {
        Self {
            account,
            environment,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.environment
    }

    /// A new context for the same environment with the account id replaced
    pub(crate) fn with_account_id(&self, id: &str) -> Self {
        Self {
            account: self.account.with_id(id),
            environment: Arc::clone(&self.environment),
        }
    }
}

/// Result of a successful login
#[derive(Debug)]
pub struct Profile {
    context: Arc<Context>,
    token: AccessToken,
}

impl Profile {
    pub fn new(context: Arc<Context>, token: AccessToken) -> Self {
        Self { context, token }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }
}
