//! Session file I/O
//!
//! Each command runs in its own process, so the command layer saves the
//! registry and current context between runs. Secrets are never written.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::session as session_config;
use crate::error::CapError;

use super::account::Account;
use super::context::Context;
use super::environment::Environment;
use super::manager::SessionManager;

/// Current context as written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContext {
    pub account: Account,
    /// Name of an entry in `environments`
    pub environment: String,
}

/// Everything persisted between commands
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(rename = "current-context", skip_serializing_if = "Option::is_none")]
    pub current_context: Option<StoredContext>,
    #[serde(default)]
    pub environments: BTreeMap<String, Environment>,
}

impl SessionState {
    /// Snapshot the registry and current context of a manager
    pub fn capture<A>(manager: &SessionManager<A>) -> Self {
        let environments = manager
            .registry()
            .iter()
            .map(|env| (env.name().to_string(), Environment::clone(env)))
            .collect();

        let current_context = manager.current_context().map(|ctx| StoredContext {
            account: ctx.account().clone(),
            environment: ctx.environment().name().to_string(),
        });

        Self {
            current_context,
            environments,
        }
    }

    /// Load this state into a manager: register environments, then restore
    /// the current context.
    pub fn restore_into<A>(self, manager: &mut SessionManager<A>) {
        for environment in self.environments.into_values() {
            manager.registry_mut().register(environment);
        }
        if let Some(stored) = self.current_context {
            let environment = manager.registry_mut().resolve(Some(&stored.environment));
            manager.restore(Context::new(stored.account, environment));
        }
    }
}

/// Handles reading and writing the session file
pub struct SessionStore {
    path: PathBuf,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store at `CAPCTL_SESSION_FILE` or ~/.capctl/session.json
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    /// Create a store with a custom path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(session_config::PATH_ENV_VAR) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(session_config::DIR_NAME)
            .join(session_config::FILE_NAME)
    }

    /// Load the session state; a missing file is an empty session
    pub fn load(&self) -> Result<SessionState, CapError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No session file at {}", self.path.display());
                return Ok(SessionState::default());
            }
            Err(e) => return Err(file_error("read session file", &self.path, e)),
        };

        serde_json::from_str(&content)
            .map_err(|e| file_error("parse session file", &self.path, e))
    }

    /// Replace the session file with `state`, readable by the owner only
    pub fn save(&self, state: &SessionState) -> Result<(), CapError> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| file_error("serialize session for", &self.path, e))?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| file_error("create session directory", dir, e))?;
        }

        // Staged next to the target so the rename stays on one filesystem
        let staging = self.path.with_extension("json.tmp");
        write_private(&staging, json.as_bytes())
            .map_err(|e| file_error("write", &staging, e))?;

        fs::rename(&staging, &self.path).map_err(|e| {
            if let Err(cleanup) = fs::remove_file(&staging) {
                debug!("Could not remove {}: {}", staging.display(), cleanup);
            }
            file_error("replace session file", &self.path, e)
        })
    }
}

fn file_error(action: &str, path: &Path, cause: impl Display) -> CapError {
    CapError::Config(format!("Failed to {} {}: {}", action, path.display(), cause))
}

/// Write `bytes` to a fresh file created with mode 0600 on Unix
fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
