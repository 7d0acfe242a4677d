//! Error handling and custom error types
//!
//! Only transport-level problems and caller mistakes are errors. A response
//! that arrives but cannot be decoded is reported as a value, never through
//! this enum.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

impl Error {
    /// True when the remote exchange itself did not complete.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::AiProvider(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(Error::AiProvider("status 500".to_string()).is_transport());
        assert!(!Error::InvalidRequest("empty instruction".to_string()).is_transport());
        assert!(!Error::Config("bad timeout".to_string()).is_transport());
    }
}
