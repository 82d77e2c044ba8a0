//! OAuth2 error taxonomy: each kind maps to a wire `error` code, an HTTP
//! status and a human description.

use serde_json::{Map, Value};

/// Error kinds raised by the protocol endpoints and grant flows.
///
/// The variant payload is the human `error_description`. Status and wire
/// code come from [`status`](OAuthError::status) and
/// [`name`](OAuthError::name); endpoints may override the status in the
/// situations RFC 6749 calls out (e.g. `invalid_client` over an
/// `Authorization` header answers 401).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthError {
    InvalidRequest(String),
    InvalidClient(String),
    InvalidGrant(String),
    InvalidScope(String),
    InvalidToken(String),
    UnauthorizedClient(String),
    UnauthorizedRequest(String),
    UnsupportedGrantType(String),
    UnsupportedResponseType(String),
    UnsupportedTokenType(String),
    AccessDenied(String),
    InsufficientScope(String),
    ServerError(String),
    InvalidArgument(String),
}

impl OAuthError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        OAuthError::InvalidRequest(message.into())
    }

    pub fn invalid_client(message: impl Into<String>) -> Self {
        OAuthError::InvalidClient(message.into())
    }

    pub fn invalid_grant(message: impl Into<String>) -> Self {
        OAuthError::InvalidGrant(message.into())
    }

    pub fn invalid_scope(message: impl Into<String>) -> Self {
        OAuthError::InvalidScope(message.into())
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        OAuthError::InvalidToken(message.into())
    }

    pub fn unauthorized_client(message: impl Into<String>) -> Self {
        OAuthError::UnauthorizedClient(message.into())
    }

    pub fn unauthorized_request(message: impl Into<String>) -> Self {
        OAuthError::UnauthorizedRequest(message.into())
    }

    pub fn unsupported_grant_type(message: impl Into<String>) -> Self {
        OAuthError::UnsupportedGrantType(message.into())
    }

    pub fn unsupported_response_type(message: impl Into<String>) -> Self {
        OAuthError::UnsupportedResponseType(message.into())
    }

    pub fn unsupported_token_type(message: impl Into<String>) -> Self {
        OAuthError::UnsupportedTokenType(message.into())
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        OAuthError::AccessDenied(message.into())
    }

    pub fn insufficient_scope(message: impl Into<String>) -> Self {
        OAuthError::InsufficientScope(message.into())
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        OAuthError::ServerError(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        OAuthError::InvalidArgument(message.into())
    }

    /// The RFC-defined `error` code sent on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            OAuthError::InvalidRequest(_) => "invalid_request",
            OAuthError::InvalidClient(_) => "invalid_client",
            OAuthError::InvalidGrant(_) => "invalid_grant",
            OAuthError::InvalidScope(_) => "invalid_scope",
            OAuthError::InvalidToken(_) => "invalid_token",
            OAuthError::UnauthorizedClient(_) => "unauthorized_client",
            OAuthError::UnauthorizedRequest(_) => "unauthorized_request",
            OAuthError::UnsupportedGrantType(_) => "unsupported_grant_type",
            OAuthError::UnsupportedResponseType(_) => "unsupported_response_type",
            OAuthError::UnsupportedTokenType(_) => "unsupported_token_type",
            OAuthError::AccessDenied(_) => "access_denied",
            OAuthError::InsufficientScope(_) => "insufficient_scope",
            OAuthError::ServerError(_) => "server_error",
            OAuthError::InvalidArgument(_) => "invalid_argument",
        }
    }

    /// The HTTP status the kind answers with by default.
    pub fn status(&self) -> u16 {
        match self {
            OAuthError::InvalidRequest(_)
            | OAuthError::InvalidClient(_)
            | OAuthError::InvalidGrant(_)
            | OAuthError::InvalidScope(_)
            | OAuthError::UnauthorizedClient(_)
            | OAuthError::UnsupportedGrantType(_)
            | OAuthError::UnsupportedResponseType(_)
            | OAuthError::UnsupportedTokenType(_)
            | OAuthError::AccessDenied(_) => 400,
            OAuthError::InvalidToken(_) | OAuthError::UnauthorizedRequest(_) => 401,
            OAuthError::InsufficientScope(_) => 403,
            OAuthError::ServerError(_) | OAuthError::InvalidArgument(_) => 500,
        }
    }

    /// The human description carried by the variant.
    pub fn description(&self) -> &str {
        match self {
            OAuthError::InvalidRequest(m)
            | OAuthError::InvalidClient(m)
            | OAuthError::InvalidGrant(m)
            | OAuthError::InvalidScope(m)
            | OAuthError::InvalidToken(m)
            | OAuthError::UnauthorizedClient(m)
            | OAuthError::UnauthorizedRequest(m)
            | OAuthError::UnsupportedGrantType(m)
            | OAuthError::UnsupportedResponseType(m)
            | OAuthError::UnsupportedTokenType(m)
            | OAuthError::AccessDenied(m)
            | OAuthError::InsufficientScope(m)
            | OAuthError::ServerError(m)
            | OAuthError::InvalidArgument(m) => m,
        }
    }

    /// Standard `{error, error_description}` JSON body.
    pub fn to_body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("error".into(), Value::String(self.name().into()));
        body.insert(
            "error_description".into(),
            Value::String(self.description().to_string()),
        );
        body
    }
}

impl std::fmt::Display for OAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name(), self.description())
    }
}

impl std::error::Error for OAuthError {}
