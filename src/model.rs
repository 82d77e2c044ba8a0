//! The data-access seam between the engine and the host application.

use async_trait::async_trait;

use crate::error::OAuthError;
use crate::types::{AuthorizationCode, Client, Token, User};

/// Capability set the host supplies for persistence and policy.
///
/// `Option` return values stand for "found or not": `Ok(None)` is a
/// protocol-level miss (wrong credentials, unknown token), `Err` is a
/// backend failure. Capabilities a host does not need default to
/// `invalid_argument`: reaching one from an endpoint means the host
/// wired up a flow its Model cannot serve, and surfaces as HTTP 500.
///
/// The engine calls the Model strictly sequentially within one request;
/// the Model itself must be safe for concurrent use across requests.
#[async_trait]
pub trait Model: Send + Sync + 'static {
    /// Fetch a client, verifying `secret` when one is supplied.
    async fn get_client(
        &self,
        id: &str,
        secret: Option<&str>,
    ) -> Result<Option<Client>, OAuthError>;

    /// Authenticate a resource owner by credentials (password grant).
    async fn get_user(
        &self,
        _username: &str,
        _password: &str,
    ) -> Result<Option<User>, OAuthError> {
        Err(OAuthError::invalid_argument(
            "model does not implement `get_user`",
        ))
    }

    /// The user a confidential client acts as (client_credentials grant).
    async fn get_user_from_client(&self, _client: &Client) -> Result<Option<User>, OAuthError> {
        Err(OAuthError::invalid_argument(
            "model does not implement `get_user_from_client`",
        ))
    }

    /// Validate, and possibly narrow, a requested scope. The default
    /// accepts the request unchanged; reject by returning
    /// `Err(OAuthError::invalid_scope(..))`.
    async fn validate_scope(
        &self,
        _user: &User,
        _client: &Client,
        scope: Option<&str>,
    ) -> Result<Option<String>, OAuthError> {
        Ok(scope.map(str::to_string))
    }

    /// Whether `token` carries the scope a protected resource requires.
    async fn verify_scope(&self, _token: &Token, _scope: &str) -> Result<bool, OAuthError> {
        Err(OAuthError::invalid_argument(
            "model does not implement `verify_scope`",
        ))
    }

    /// Persist an authorization code; the returned record is what later
    /// redemption will see.
    async fn save_authorization_code(
        &self,
        _code: AuthorizationCode,
    ) -> Result<AuthorizationCode, OAuthError> {
        Err(OAuthError::invalid_argument(
            "model does not implement `save_authorization_code`",
        ))
    }

    async fn get_authorization_code(
        &self,
        _code: &str,
    ) -> Result<Option<AuthorizationCode>, OAuthError> {
        Err(OAuthError::invalid_argument(
            "model does not implement `get_authorization_code`",
        ))
    }

    /// Invalidate a redeemed code. `Ok(false)` means the code was already
    /// gone, which redemption treats as an invalid grant.
    async fn revoke_authorization_code(
        &self,
        _code: &AuthorizationCode,
    ) -> Result<bool, OAuthError> {
        Err(OAuthError::invalid_argument(
            "model does not implement `revoke_authorization_code`",
        ))
    }

    /// Persist a freshly issued token; the returned record feeds the wire
    /// response and may carry extended attributes.
    async fn save_token(&self, token: Token) -> Result<Token, OAuthError>;

    async fn get_access_token(&self, token: &str) -> Result<Option<Token>, OAuthError>;

    async fn get_refresh_token(&self, _token: &str) -> Result<Option<Token>, OAuthError> {
        Err(OAuthError::invalid_argument(
            "model does not implement `get_refresh_token`",
        ))
    }

    async fn revoke_access_token(&self, _token: &Token) -> Result<bool, OAuthError> {
        Err(OAuthError::invalid_argument(
            "model does not implement `revoke_access_token`",
        ))
    }

    /// Invalidate a refresh token. Rotation requires `Ok(true)` before a
    /// replacement is saved.
    async fn revoke_refresh_token(&self, _token: &Token) -> Result<bool, OAuthError> {
        Err(OAuthError::invalid_argument(
            "model does not implement `revoke_refresh_token`",
        ))
    }

    /// Custom access-token generator; `Ok(None)` falls back to the
    /// engine's opaque generator.
    async fn generate_access_token(
        &self,
        _client: &Client,
        _user: &User,
        _scope: Option<&str>,
    ) -> Result<Option<String>, OAuthError> {
        Ok(None)
    }

    /// Custom refresh-token generator; `Ok(None)` falls back.
    async fn generate_refresh_token(
        &self,
        _client: &Client,
        _user: &User,
        _scope: Option<&str>,
    ) -> Result<Option<String>, OAuthError> {
        Ok(None)
    }

    /// Custom authorization-code generator; `Ok(None)` falls back.
    async fn generate_authorization_code(
        &self,
        _client: &Client,
        _user: &User,
        _scope: Option<&str>,
    ) -> Result<Option<String>, OAuthError> {
        Ok(None)
    }
}
