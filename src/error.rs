use std::fmt;

/// Custom error type for session and login operations
#[derive(Debug)]
pub enum CapError {
    /// Incomplete or inconsistent account input; nothing was changed
    Validation(String),
    /// The identity provider rejected the login
    Authentication(String),
    /// HTTP request failed
    Http(reqwest::Error),
    /// Identity provider returned an unexpected error response
    Api { status: u16, message: String },
    /// JSON parsing error
    Json(String),
    /// Configuration error (session file, certificates, prompts)
    Config(String),
    /// Login did not complete within the allotted time
    Timeout(u64),
}

impl fmt::Display for CapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapError::Validation(msg) => write!(f, "Invalid login request: {}", msg),
            CapError::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
            CapError::Http(e) => write!(f, "HTTP request failed: {}", e),
            CapError::Api { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            CapError::Json(msg) => write!(f, "JSON error: {}", msg),
            CapError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CapError::Timeout(secs) => write!(f, "Login timed out after {} seconds", secs),
        }
    }
}

impl std::error::Error for CapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CapError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CapError {
    fn from(err: reqwest::Error) -> Self {
        CapError::Http(err)
    }
}

impl From<serde_json::Error> for CapError {
    fn from(err: serde_json::Error) -> Self {
        CapError::Json(err.to_string())
    }
}

impl From<std::io::Error> for CapError {
    fn from(err: std::io::Error) -> Self {
        CapError::Config(err.to_string())
    }
}

/// Result type alias for capctl operations
pub type Result<T> = std::result::Result<T, CapError>;
