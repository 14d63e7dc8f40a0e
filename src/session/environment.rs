//! Capacity environments and the registry that provisions them

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{auth, environment as env_config};

/// A named target environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    name: String,
    /// Data plane endpoint of the capacity service
    endpoint: String,
    /// AAD authority host used for login
    authority: String,
    /// Resource the access token is issued for
    resource: String,
}

impl Environment {
    /// Create an environment whose endpoint is derived from its name
    pub fn new(name: &str, authority: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint: format!("{}{}", env_config::ENDPOINT_SCHEME, name),
            authority: authority.trim_end_matches('/').to_string(),
            resource: auth::RESOURCE.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

/// Named environments known to the session.
///
/// Resolution is total: an unknown name provisions a new environment and an
/// empty name yields the default one. Entries are never removed.
#[derive(Debug)]
pub struct EnvironmentRegistry {
    authority: String,
    environments: BTreeMap<String, Arc<Environment>>,
}

impl Default for EnvironmentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentRegistry {
    /// Registry using the public AAD authority
    pub fn new() -> Self {
        Self::with_authority(auth::AUTHORITY)
    }

    /// Registry whose provisioned environments log in against `authority`
    pub fn with_authority(authority: &str) -> Self {
        let mut registry = Self {
            authority: authority.trim_end_matches('/').to_string(),
            environments: BTreeMap::new(),
        };
        let default = Environment::new(env_config::DEFAULT_NAME, &registry.authority);
        registry
            .environments
            .insert(default.name.clone(), Arc::new(default));
        registry
    }

    /// Name of the environment used when none is requested
    pub fn default_name() -> &'static str {
        env_config::DEFAULT_NAME
    }

    /// Registry key for a requested name: trimmed, empty means the default
    fn normalize(name: Option<&str>) -> &str {
        name.map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(env_config::DEFAULT_NAME)
    }

    /// Resolve an environment by name, provisioning unknown names
    pub fn resolve(&mut self, name: Option<&str>) -> Arc<Environment> {
        let name = Self::normalize(name);

        if let Some(existing) = self.environments.get(name) {
            return Arc::clone(existing);
        }

        debug!("Provisioning environment '{}'", name);
        let environment = Arc::new(Environment::new(name, &self.authority));
        self.environments
            .insert(name.to_string(), Arc::clone(&environment));
        environment
    }

    /// What `resolve` would return, without provisioning anything.
    ///
    /// The flag is true when the environment is not registered yet.
    pub fn lookup(&self, name: Option<&str>) -> (Arc<Environment>, bool) {
        let name = Self::normalize(name);
        match self.environments.get(name) {
            Some(existing) => (Arc::clone(existing), false),
            None => (Arc::new(Environment::new(name, &self.authority)), true),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.environments.contains_key(Self::normalize(Some(name)))
    }

    /// Register a fully specified environment; an existing entry with the
    /// same name is kept and returned instead.
    pub fn register(&mut self, environment: Environment) -> Arc<Environment> {
        Arc::clone(
            self.environments
                .entry(environment.name.clone())
                .or_insert_with(|| Arc::new(environment)),
        )
    }

    /// All environments ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Environment>> {
        self.environments.values()
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_environment_always_present() {
        let registry = EnvironmentRegistry::new();
        assert!(registry.exists(env_config::DEFAULT_NAME));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_empty_returns_default() {
        let mut registry = EnvironmentRegistry::new();
        let a = registry.resolve(None);
        let b = registry.resolve(Some(""));
        let c = registry.resolve(Some("   "));
        assert_eq!(a.name(), env_config::DEFAULT_NAME);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut registry = EnvironmentRegistry::new();
        let first = registry.resolve(Some("westeurope.pbidedicated.windows.net"));
        let second = registry.resolve(Some("westeurope.pbidedicated.windows.net"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_resolve_provisions_unknown_name() {
        let mut registry = EnvironmentRegistry::new();
        assert!(!registry.exists("prod"));
        let env = registry.resolve(Some("prod"));
        assert!(registry.exists("prod"));
        assert_eq!(env.name(), "prod");
        assert_eq!(env.endpoint(), "https://prod");
        assert_eq!(env.authority(), auth::AUTHORITY);
        assert_eq!(env.resource(), auth::RESOURCE);
    }

    #[test]
    fn test_exists_normalizes_like_resolve() {
        let mut registry = EnvironmentRegistry::new();
        assert!(registry.exists(""));
        assert!(registry.exists("   "));
        registry.resolve(Some("  prod "));
        assert!(registry.exists("prod"));
        assert!(registry.exists(" prod"));
        assert!(!registry.exists("PROD"));
    }

    #[test]
    fn test_lookup_does_not_provision() {
        let mut registry = EnvironmentRegistry::new();
        let (env, new) = registry.lookup(Some("prod"));
        assert!(new);
        assert_eq!(env.endpoint(), "https://prod");
        assert!(!registry.exists("prod"));

        let resolved = registry.resolve(Some("prod"));
        let (env, new) = registry.lookup(Some("prod"));
        assert!(!new);
        assert!(Arc::ptr_eq(&env, &resolved));

        let (default, new) = registry.lookup(None);
        assert!(!new);
        assert_eq!(default.name(), env_config::DEFAULT_NAME);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut registry = EnvironmentRegistry::new();
        let lower = registry.resolve(Some("prod"));
        let upper = registry.resolve(Some("PROD"));
        assert!(!Arc::ptr_eq(&lower, &upper));
    }

    #[test]
    fn test_with_authority_applies_to_provisioned_environments() {
        let mut registry = EnvironmentRegistry::with_authority("http://127.0.0.1:9000/");
        assert_eq!(registry.resolve(None).authority(), "http://127.0.0.1:9000");
        assert_eq!(
            registry.resolve(Some("dev")).authority(),
            "http://127.0.0.1:9000"
        );
    }

    #[test]
    fn test_register_keeps_existing_entry() {
        let mut registry = EnvironmentRegistry::new();
        let original = registry.resolve(Some("prod"));
        let registered = registry.register(Environment::new("prod", "https://other"));
        assert!(Arc::ptr_eq(&original, &registered));
        assert_eq!(registered.authority(), auth::AUTHORITY);
    }

    #[test]
    fn test_register_adds_new_entry() {
        let mut registry = EnvironmentRegistry::new();
        let env = registry.register(Environment::new("custom", "https://login.example"));
        assert!(registry.exists("custom"));
        assert_eq!(env.authority(), "https://login.example");
        assert!(Arc::ptr_eq(&env, &registry.resolve(Some("custom"))));
    }

    #[test]
    fn test_iter_is_ordered() {
        let mut registry = EnvironmentRegistry::new();
        registry.resolve(Some("zeta"));
        registry.resolve(Some("alpha"));
        let names: Vec<&str> = registry.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["alpha", env_config::DEFAULT_NAME, "zeta"]);
    }
}
