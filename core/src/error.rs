//! Error types for the policy API client.
//!
//! # Design
//! `Api` gets a dedicated variant carrying the server's structured error
//! body because callers frequently branch on the server-assigned `code`
//! ("the policy does not compile", "the resource does not exist") rather
//! than on the HTTP status. Operational failures keep their own variants:
//! `Transport` propagates the agent error verbatim, `Encode`/`Decode`
//! surface JSON failures on the way out and back in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server error codes, as found in [`ApiError::code`].
pub mod codes {
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const EVALUATION_ERROR: &str = "evaluation_error";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const INVALID_PARAMETER: &str = "invalid_parameter";
    pub const INVALID_OPERATION: &str = "invalid_operation";
    pub const RESOURCE_NOT_FOUND: &str = "resource_not_found";
    pub const RESOURCE_CONFLICT: &str = "resource_conflict";
    pub const UNDEFINED_DOCUMENT: &str = "undefined_document";
}

/// Errors returned by client operations.
#[derive(Debug)]
pub enum Error {
    /// The configured base URL is not a parseable absolute URL.
    InvalidUrl(String),

    /// A network-level failure from the underlying agent (DNS, connection
    /// refused, timeout). Returned unchanged, never retried or classified.
    Transport(ureq::Error),

    /// The request payload could not be serialized to JSON.
    Encode(serde_json::Error),

    /// The response body (success or error shape) was not valid JSON for
    /// the expected type.
    Decode(serde_json::Error),

    /// The server answered with a non-2xx status and a well-formed
    /// structured error body.
    Api(ApiError),
}

impl Error {
    /// The server error code, when this is an [`Error::Api`].
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Error::Api(e) => Some(&e.code),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidUrl(url) => write!(f, "invalid base URL: {url}"),
            Error::Transport(e) => write!(f, "transport error: {e}"),
            Error::Encode(e) => write!(f, "serialization failed: {e}"),
            Error::Decode(e) => write!(f, "deserialization failed: {e}"),
            Error::Api(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidUrl(_) => None,
            Error::Transport(e) => Some(e),
            Error::Encode(e) | Error::Decode(e) => Some(e),
            Error::Api(e) => Some(e),
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(e: ureq::Error) -> Self {
        Error::Transport(e)
    }
}

/// An error response body sent by the server for any non-2xx status.
///
/// Compile failures nest one entry per offending expression under
/// `errors`, each with its own source [`Location`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// A position in policy source code.
///
/// `text` and `offset` are populated only by server-side tooling and are
/// not part of the wire format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(skip)]
    pub text: Vec<u8>,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub row: usize,
    #[serde(default)]
    pub col: usize,
    #[serde(skip)]
    pub offset: usize,
}
