//! capctl - Log into Power BI Embedded capacity environments
//!
//! Keeps a single current session context (account + environment) and
//! obtains access tokens for it from Azure Active Directory.
//!
//! # Example
//!
//! ```bash
//! # Device code sign-in against the default environment
//! capctl login
//!
//! # User credential against a named environment
//! capctl login westeurope.pbidedicated.windows.net -u alice@contoso.com
//!
//! # Service principal with a client secret
//! capctl login prod --service-principal --tenant contoso.onmicrosoft.com \
//!     --application-id <APP_ID> -p <SECRET>
//!
//! # Show the current context as JSON
//! capctl context -o json
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod session;
pub mod ui;

pub use auth::{AadClient, AccessToken, Authenticator, TokenGrant};
pub use cli::{Cli, Command, LoginArgs, OutputFormat};
pub use error::{CapError, Result};
pub use session::{
    decide_context, run_context_command, run_env_command, run_login_command,
    run_logout_command, Account, AccountKind, AccountOptions, Context, ContextDecision,
    Credential, Environment, EnvironmentRegistry, LoginRequest, Profile, SessionManager,
    SessionStore, SharedSession,
};
