//! Error types surfaced by the client.

use thiserror::Error;

/// A specialized Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the client.
///
/// Every failure carries enough context to act on: request errors keep the
/// status code and response body, connection errors keep the transport
/// source, and both record how many attempts were made before giving up.
#[derive(Debug, Error)]
pub enum Error {
    /// A write operation was attempted against a server with no configured
    /// API key and secret.
    #[error("no API key/secret configured for {server}: only GET requests are allowed")]
    MissingCredentials { server: String },

    /// The server answered with a terminal non-2xx status, or retries were
    /// exhausted on a transient one.
    #[error("{method} {url} returned {status} after {attempts} attempt(s): {body}")]
    Request {
        method: String,
        url: String,
        status: u16,
        body: String,
        attempts: usize,
    },

    /// The transport failed (connection refused, timeout, interrupted body)
    /// and retries were exhausted.
    #[error("connection to {url} failed after {attempts} attempt(s): {source}")]
    Connection {
        url: String,
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },

    /// The response body could not be decoded as JSON.
    #[error("failed to decode JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// The response body could not be decoded as YAML.
    #[error("failed to decode YAML response: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Config file or client construction problem.
    #[error("config error: {0}")]
    Config(String),

    /// Signature computation problem.
    #[error("signature error: {0}")]
    Signature(String),

    /// The caller asked for something the API cannot express.
    #[error("invalid request: {0}")]
    Validation(String),
}

impl Error {
    /// Returns the HTTP status code if this is a request error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the response body text if this is a request error.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Request { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns how many attempts were made, for errors that went through
    /// the retry loop.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            Error::Request { attempts, .. } | Error::Connection { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
