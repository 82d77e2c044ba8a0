//! Server façade: holds the Model and per-endpoint defaults, overlays
//! per-call overrides, constructs the endpoint and delegates.

use std::collections::HashMap;
use std::sync::Arc;

use crate::endpoint::authenticate::{AuthenticateEndpoint, AuthenticateOptions};
use crate::endpoint::authorize::{AuthenticateHandler, AuthorizeEndpoint, AuthorizeOptions};
use crate::endpoint::introspect::{IntrospectEndpoint, IntrospectOptions};
use crate::endpoint::revoke::{RevokeEndpoint, RevokeOptions};
use crate::endpoint::token::{TokenEndpoint, TokenOptions};
use crate::error::OAuthError;
use crate::grants::GrantType;
use crate::model::Model;
use crate::request::Request;
use crate::response::Response;
use crate::types::User;

/// The engine's front door.
///
/// Defaults are fixed at construction (builder-style); every endpoint
/// call clones them and overlays the caller's overrides, so no request
/// can leak configuration into another.
pub struct OAuthServer {
    model: Arc<dyn Model>,
    authorize_options: AuthorizeOptions,
    token_options: TokenOptions,
    authenticate_options: AuthenticateOptions,
    introspect_options: IntrospectOptions,
    revoke_options: RevokeOptions,
}

impl OAuthServer {
    /// A server with the standard option defaults.
    pub fn new(model: Arc<dyn Model>) -> Self {
        OAuthServer {
            model,
            authorize_options: AuthorizeOptions::default(),
            token_options: TokenOptions::default(),
            authenticate_options: AuthenticateOptions::default(),
            introspect_options: IntrospectOptions::default(),
            revoke_options: RevokeOptions::default(),
        }
    }

    pub fn authorize_options(mut self, options: AuthorizeOptions) -> Self {
        self.authorize_options = options;
        self
    }

    pub fn token_options(mut self, options: TokenOptions) -> Self {
        self.token_options = options;
        self
    }

    pub fn authenticate_options(mut self, options: AuthenticateOptions) -> Self {
        self.authenticate_options = options;
        self
    }

    pub fn introspect_options(mut self, options: IntrospectOptions) -> Self {
        self.introspect_options = options;
        self
    }

    pub fn revoke_options(mut self, options: RevokeOptions) -> Self {
        self.revoke_options = options;
        self
    }

    /// Register an extension grant under its wire `grant_type`
    /// identifier (an NCHAR name or absolute URI).
    pub fn extension_grant(
        mut self,
        grant_type: impl Into<String>,
        grant: Arc<dyn GrantType>,
    ) -> Self {
        self.token_options
            .extended_grant_types
            .insert(grant_type.into(), grant);
        self
    }

    /// RFC 6749 §3.1 authorization endpoint.
    pub async fn authorize(
        &self,
        request: &Request,
        response: &mut Response,
        overrides: Option<AuthorizeOverrides>,
    ) -> Result<(), OAuthError> {
        let mut options = self.authorize_options.clone();
        if let Some(overrides) = overrides {
            overrides.apply(&mut options);
        }
        AuthorizeEndpoint::new(self.model.clone(), options)
            .execute(request, response)
            .await
    }

    /// RFC 6749 §3.2 token endpoint.
    pub async fn token(
        &self,
        request: &Request,
        response: &mut Response,
        overrides: Option<TokenOverrides>,
    ) -> Result<(), OAuthError> {
        let mut options = self.token_options.clone();
        if let Some(overrides) = overrides {
            overrides.apply(&mut options);
        }
        TokenEndpoint::new(self.model.clone(), options)
            .execute(request, response)
            .await
    }

    /// RFC 6750 bearer authentication for protected resources.
    pub async fn authenticate(
        &self,
        request: &Request,
        response: &mut Response,
        overrides: Option<AuthenticateOverrides>,
    ) -> Result<User, OAuthError> {
        let mut options = self.authenticate_options.clone();
        if let Some(overrides) = overrides {
            overrides.apply(&mut options);
        }
        AuthenticateEndpoint::new(self.model.clone(), options)
            .execute(request, response)
            .await
    }

    /// RFC 7662 introspection endpoint.
    pub async fn introspect(
        &self,
        request: &Request,
        response: &mut Response,
        overrides: Option<IntrospectOverrides>,
    ) -> Result<(), OAuthError> {
        let mut options = self.introspect_options.clone();
        if let Some(overrides) = overrides {
            overrides.apply(&mut options);
        }
        IntrospectEndpoint::new(self.model.clone(), options)
            .execute(request, response)
            .await
    }

    /// RFC 7009 revocation endpoint.
    pub async fn revoke(
        &self,
        request: &Request,
        response: &mut Response,
        overrides: Option<RevokeOverrides>,
    ) -> Result<(), OAuthError> {
        let mut options = self.revoke_options.clone();
        if let Some(overrides) = overrides {
            overrides.apply(&mut options);
        }
        RevokeEndpoint::new(self.model.clone(), options)
            .execute(request, response)
            .await
    }
}

/// `"true"`/`"false"` coercion for option values that travelled as query
/// parameters. Anything else is "unset".
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.parse().ok()
}

/// Per-call overrides for [`OAuthServer::authorize`]. Unset fields keep
/// the server default.
#[derive(Clone, Default)]
pub struct AuthorizeOverrides {
    pub authenticate_handler: Option<Arc<dyn AuthenticateHandler>>,
    pub access_token_lifetime: Option<u64>,
    pub authorization_code_lifetime: Option<u64>,
    pub allow_empty_state: Option<bool>,
}

impl AuthorizeOverrides {
    /// Build overrides from a string map, as handed through by a query
    /// layer.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        AuthorizeOverrides {
            authenticate_handler: None,
            access_token_lifetime: params.get("access_token_lifetime").and_then(|v| parse_u64(v)),
            authorization_code_lifetime: params
                .get("authorization_code_lifetime")
                .and_then(|v| parse_u64(v)),
            allow_empty_state: params.get("allow_empty_state").and_then(|v| parse_bool(v)),
        }
    }

    fn apply(self, options: &mut AuthorizeOptions) {
        if let Some(handler) = self.authenticate_handler {
            options.authenticate_handler = Some(handler);
        }
        if let Some(lifetime) = self.access_token_lifetime {
            options.access_token_lifetime = lifetime;
        }
        if let Some(lifetime) = self.authorization_code_lifetime {
            options.authorization_code_lifetime = lifetime;
        }
        if let Some(allow) = self.allow_empty_state {
            options.allow_empty_state = allow;
        }
    }
}

/// Per-call overrides for [`OAuthServer::token`].
#[derive(Clone, Default)]
pub struct TokenOverrides {
    pub access_token_lifetime: Option<u64>,
    pub refresh_token_lifetime: Option<u64>,
    pub allow_extended_token_attributes: Option<bool>,
    pub always_issue_new_refresh_token: Option<bool>,
    pub require_client_authentication: Option<HashMap<String, bool>>,
}

impl TokenOverrides {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        TokenOverrides {
            access_token_lifetime: params.get("access_token_lifetime").and_then(|v| parse_u64(v)),
            refresh_token_lifetime: params
                .get("refresh_token_lifetime")
                .and_then(|v| parse_u64(v)),
            allow_extended_token_attributes: params
                .get("allow_extended_token_attributes")
                .and_then(|v| parse_bool(v)),
            always_issue_new_refresh_token: params
                .get("always_issue_new_refresh_token")
                .and_then(|v| parse_bool(v)),
            require_client_authentication: None,
        }
    }

    fn apply(self, options: &mut TokenOptions) {
        if let Some(lifetime) = self.access_token_lifetime {
            options.access_token_lifetime = lifetime;
        }
        if let Some(lifetime) = self.refresh_token_lifetime {
            options.refresh_token_lifetime = lifetime;
        }
        if let Some(allow) = self.allow_extended_token_attributes {
            options.allow_extended_token_attributes = allow;
        }
        if let Some(rotate) = self.always_issue_new_refresh_token {
            options.always_issue_new_refresh_token = rotate;
        }
        if let Some(table) = self.require_client_authentication {
            options.require_client_authentication = table;
        }
    }
}

/// Per-call overrides for [`OAuthServer::authenticate`].
#[derive(Clone, Default)]
pub struct AuthenticateOverrides {
    pub scope: Option<String>,
    pub add_accepted_scopes_header: Option<bool>,
    pub add_authorized_scopes_header: Option<bool>,
    pub allow_bearer_tokens_in_query_string: Option<bool>,
}

impl AuthenticateOverrides {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        AuthenticateOverrides {
            scope: params.get("scope").cloned(),
            add_accepted_scopes_header: params
                .get("add_accepted_scopes_header")
                .and_then(|v| parse_bool(v)),
            add_authorized_scopes_header: params
                .get("add_authorized_scopes_header")
                .and_then(|v| parse_bool(v)),
            allow_bearer_tokens_in_query_string: params
                .get("allow_bearer_tokens_in_query_string")
                .and_then(|v| parse_bool(v)),
        }
    }

    fn apply(self, options: &mut AuthenticateOptions) {
        if let Some(scope) = self.scope {
            options.scope = Some(scope);
        }
        if let Some(add) = self.add_accepted_scopes_header {
            options.add_accepted_scopes_header = add;
        }
        if let Some(add) = self.add_authorized_scopes_header {
            options.add_authorized_scopes_header = add;
        }
        if let Some(allow) = self.allow_bearer_tokens_in_query_string {
            options.allow_bearer_tokens_in_query_string = allow;
        }
    }
}

/// Per-call overrides for [`OAuthServer::introspect`].
#[derive(Clone, Copy, Default)]
pub struct IntrospectOverrides {
    pub is_client_secret_required: Option<bool>,
}

impl IntrospectOverrides {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        IntrospectOverrides {
            is_client_secret_required: params
                .get("is_client_secret_required")
                .and_then(|v| parse_bool(v)),
        }
    }

    fn apply(self, options: &mut IntrospectOptions) {
        if let Some(required) = self.is_client_secret_required {
            options.is_client_secret_required = required;
        }
    }
}

/// Per-call overrides for [`OAuthServer::revoke`].
#[derive(Clone, Copy, Default)]
pub struct RevokeOverrides {
    pub is_client_secret_required: Option<bool>,
}

impl RevokeOverrides {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        RevokeOverrides {
            is_client_secret_required: params
                .get("is_client_secret_required")
                .and_then(|v| parse_bool(v)),
        }
    }

    fn apply(self, options: &mut RevokeOptions) {
        if let Some(required) = self.is_client_secret_required {
            options.is_client_secret_required = required;
        }
    }
}
