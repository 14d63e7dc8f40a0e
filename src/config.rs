/// Default values for CLI
pub mod defaults {
    /// Default log level
    pub const LOG_LEVEL: &str = "warn";

    /// Default login timeout in seconds (covers the device code window)
    pub const LOGIN_TIMEOUT_SECS: u64 = 300;
}

/// Configuration constants for capacity environments
pub mod environment {
    /// Environment used when no name is given
    pub const DEFAULT_NAME: &str = "pbidedicated.windows.net";

    /// Environment variable naming the environment to log into
    pub const ENV_VAR: &str = "CAPCTL_ENVIRONMENT";

    /// Environment variable overriding the AAD authority host
    pub const AUTHORITY_ENV_VAR: &str = "CAPCTL_AUTHORITY";

    /// Scheme prepended to environment names to build the data plane endpoint
    pub const ENDPOINT_SCHEME: &str = "https://";
}

/// Configuration constants for Azure AD authentication
pub mod auth {
    /// Default AAD authority host
    pub const AUTHORITY: &str = "https://login.windows.net";

    /// Resource the access token is requested for
    pub const RESOURCE: &str = "https://analysis.windows.net/powerbi/api";

    /// Public client used for interactive and password logins of users
    pub const PUBLIC_CLIENT_ID: &str = "1950a258-227b-4e31-a9cf-717495945fc2";

    /// Tenant segment used for user logins
    pub const COMMON_TENANT: &str = "common";

    /// Token endpoint path (relative to authority/tenant)
    pub const TOKEN_PATH: &str = "oauth2/token";

    /// Device code endpoint path (relative to authority/tenant)
    pub const DEVICE_CODE_PATH: &str = "oauth2/devicecode";

    /// JWT bearer client assertion type
    pub const CLIENT_ASSERTION_TYPE: &str =
        "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

    /// Lifetime of a signed client assertion in seconds
    pub const ASSERTION_LIFETIME_SECS: i64 = 600;

    /// Extra polling delay applied when AAD answers `slow_down`
    pub const SLOW_DOWN_INCREMENT_SECS: u64 = 5;

    /// Directory (relative to HOME) holding `<THUMBPRINT>.pem` private keys
    pub const CERTIFICATE_DIR: &str = ".capctl/certs";

    /// Environment variable overriding the certificate directory
    pub const CERTIFICATE_DIR_ENV_VAR: &str = "CAPCTL_CERTIFICATE_DIR";

    /// Per-request HTTP timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Configuration constants for the persisted session file
pub mod session {
    /// Directory name (relative to HOME)
    pub const DIR_NAME: &str = ".capctl";

    /// Session file name
    pub const FILE_NAME: &str = "session.json";

    /// Environment variable overriding the full session file path
    pub const PATH_ENV_VAR: &str = "CAPCTL_SESSION_FILE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_environment_is_host_name() {
        assert!(environment::DEFAULT_NAME.contains('.'));
        assert!(!environment::DEFAULT_NAME.starts_with("https://"));
    }

    #[test]
    fn test_authority_has_no_trailing_slash() {
        assert!(auth::AUTHORITY.starts_with("https://"));
        assert!(!auth::AUTHORITY.ends_with('/'));
    }

    #[test]
    fn test_endpoint_paths_are_relative() {
        assert!(!auth::TOKEN_PATH.starts_with('/'));
        assert!(!auth::DEVICE_CODE_PATH.starts_with('/'));
    }
}
