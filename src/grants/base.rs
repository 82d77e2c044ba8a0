//! Helpers shared by every grant flow: scope reading, token generation
//! with Model override, and expiry computation.

use chrono::{DateTime, Duration, Utc};

use crate::crypto;
use crate::error::OAuthError;
use crate::model::Model;
use crate::request::Request;
use crate::types::{Client, User};
use crate::validators;

/// Requested scope from the form body, format-checked.
pub(crate) fn read_scope(request: &Request) -> Result<Option<String>, OAuthError> {
    match request.body_param("scope") {
        None => Ok(None),
        Some(scope) => {
            if !validators::is_nqschar(scope) {
                return Err(OAuthError::invalid_scope("Invalid parameter: `scope`"));
            }
            Ok(Some(scope.to_string()))
        }
    }
}

/// Access token string: the Model's generator when it supplies one, the
/// engine's opaque generator otherwise.
pub(crate) async fn generate_access_token(
    model: &dyn Model,
    client: &Client,
    user: &User,
    scope: Option<&str>,
) -> Result<String, OAuthError> {
    match model.generate_access_token(client, user, scope).await? {
        Some(token) => Ok(token),
        None => crypto::generate_random_token(),
    }
}

/// Refresh token string, same override rule.
pub(crate) async fn generate_refresh_token(
    model: &dyn Model,
    client: &Client,
    user: &User,
    scope: Option<&str>,
) -> Result<String, OAuthError> {
    match model.generate_refresh_token(client, user, scope).await? {
        Some(token) => Ok(token),
        None => crypto::generate_random_token(),
    }
}

/// Authorization code string, same override rule.
pub(crate) async fn generate_authorization_code(
    model: &dyn Model,
    client: &Client,
    user: &User,
    scope: Option<&str>,
) -> Result<String, OAuthError> {
    match model.generate_authorization_code(client, user, scope).await? {
        Some(code) => Ok(code),
        None => crypto::generate_random_token(),
    }
}

/// `now + lifetime` seconds.
pub(crate) fn expiry(lifetime_seconds: u64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(lifetime_seconds as i64)
}
