//! Session management
//!
//! Owns the current login context and decides, per login, whether it is
//! reused or replaced. Environments are provisioned on first use and
//! shared between contexts.

mod account;
mod commands;
mod context;
mod environment;
mod manager;
mod store;

pub use account::{Account, AccountKind, AccountOptions, Credential};
pub use commands::{
    run_context_command, run_env_command, run_login, run_login_command, run_login_preview,
    run_logout, run_logout_command,
};
pub use context::{Context, Profile};
pub use environment::{Environment, EnvironmentRegistry};
pub use manager::{
    decide_context, ContextDecision, LoginPlan, LoginRequest, SessionManager, SharedSession,
};
pub use store::{SessionState, SessionStore, StoredContext};
