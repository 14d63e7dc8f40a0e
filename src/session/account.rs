//! Account identities and the credentials used to build them

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{CapError, Result};

/// Kind of identity, carrying the fields each kind requires
///
/// The tenant lives inside the service principal variants, so an account has
/// a tenant exactly when it is not a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AccountKind {
    /// Interactive or password user
    User,
    /// Service principal authenticating with a client secret
    ServicePrincipalWithPassword { tenant: String },
    /// Service principal authenticating with a certificate
    ServicePrincipalWithCertificate { tenant: String, thumbprint: String },
}

impl AccountKind {
    /// Tenant of a service principal, `None` for users
    pub fn tenant(&self) -> Option<&str> {
        match self {
            AccountKind::User => None,
            AccountKind::ServicePrincipalWithPassword { tenant }
            | AccountKind::ServicePrincipalWithCertificate { tenant, .. } => Some(tenant),
        }
    }

    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::User => "User",
            AccountKind::ServicePrincipalWithPassword { .. } => "ServicePrincipal (secret)",
            AccountKind::ServicePrincipalWithCertificate { .. } => "ServicePrincipal (certificate)",
        }
    }
}

/// An identity that can be logged in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: String,
    kind: AccountKind,
}

impl Account {
    /// A user account; an empty id stands for a not yet known interactive user
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: AccountKind::User,
        }
    }

    /// Build the account for a login request.
    ///
    /// Users take the credential username (or stay anonymous). Service
    /// principals need a tenant plus either a credential (client secret) or a
    /// certificate thumbprint; the application id wins over the username.
    pub fn from_credential(credential: Option<&Credential>, options: &AccountOptions) -> Result<Self> {
        let username = credential.map(Credential::username).filter(|u| !u.is_empty());

        if !options.service_principal {
            return Ok(Self::user(username.unwrap_or_default()));
        }

        let tenant = non_empty(options.tenant.as_deref()).ok_or_else(|| {
            CapError::Validation("a tenant is required for service principal logins".to_string())
        })?;

        let kind = match (credential, non_empty(options.certificate_thumbprint.as_deref())) {
            (Some(_), _) => AccountKind::ServicePrincipalWithPassword {
                tenant: tenant.to_string(),
            },
            (None, Some(thumbprint)) => AccountKind::ServicePrincipalWithCertificate {
                tenant: tenant.to_string(),
                thumbprint: normalize_thumbprint(thumbprint),
            },
            (None, None) => {
                return Err(CapError::Validation(
                    "service principal logins need a credential or a certificate thumbprint"
                        .to_string(),
                ))
            }
        };

        let id = non_empty(options.application_id.as_deref())
            .or(username)
            .ok_or_else(|| {
                CapError::Validation(
                    "an application id is required for service principal logins".to_string(),
                )
            })?;

        Ok(Self {
            id: id.to_string(),
            kind,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    pub fn tenant(&self) -> Option<&str> {
        self.kind.tenant()
    }

    /// Same account under a newly learned id
    pub(crate) fn with_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: self.kind.clone(),
        }
    }
}

/// Options that shape account construction besides the credential
#[derive(Debug, Clone, Default)]
pub struct AccountOptions {
    pub service_principal: bool,
    pub tenant: Option<String>,
    pub application_id: Option<String>,
    pub certificate_thumbprint: Option<String>,
}

/// Username and secret supplied explicitly for a login
#[derive(Debug)]
pub struct Credential {
    username: String,
    secret: SecretString,
}

impl Credential {
    pub fn new(username: impl Into<String>, secret: SecretString) -> Self {
        Self {
            username: username.into(),
            secret,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Give up the username and keep only the secret
    pub fn into_secret(self) -> SecretString {
        self.secret
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Thumbprints are compared as upper-case hex without separators
fn normalize_thumbprint(thumbprint: &str) -> String {
    thumbprint
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect::<String>()
        .to_uppercase()
}
