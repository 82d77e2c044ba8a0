//! Authorization endpoint (RFC 6749 §3.1): authenticates the resource
//! owner, validates the client, and answers with a code or implicit-token
//! redirect.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;
use url::{form_urlencoded, Url};

use super::authenticate::{AuthenticateEndpoint, AuthenticateOptions};
use super::write_error;
use crate::error::OAuthError;
use crate::grants::base;
use crate::grants::ImplicitGrant;
use crate::model::Model;
use crate::request::Request;
use crate::response::Response;
use crate::types::{AuthorizationCode, Client, Token, User};
use crate::validators;

/// Establishes the end user's identity during authorization, typically a
/// login page. When the host supplies none, the bearer
/// [`AuthenticateEndpoint`] is used: the user-agent must present a valid
/// access token.
#[async_trait]
pub trait AuthenticateHandler: Send + Sync {
    /// Return the authenticated user, or `None` when no identity could
    /// be established.
    async fn execute(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<Option<User>, OAuthError>;
}

#[async_trait]
impl AuthenticateHandler for AuthenticateEndpoint {
    async fn execute(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<Option<User>, OAuthError> {
        AuthenticateEndpoint::execute(self, request, response)
            .await
            .map(Some)
    }
}

/// Options for [`AuthorizeEndpoint`].
#[derive(Clone)]
pub struct AuthorizeOptions {
    /// Resource-owner authenticator; bearer authentication when `None`.
    pub authenticate_handler: Option<Arc<dyn AuthenticateHandler>>,
    /// Lifetime of implicit-grant access tokens, seconds.
    pub access_token_lifetime: u64,
    /// Lifetime of authorization codes, seconds.
    pub authorization_code_lifetime: u64,
    /// Accept requests without a `state` parameter.
    pub allow_empty_state: bool,
}

impl Default for AuthorizeOptions {
    fn default() -> Self {
        AuthorizeOptions {
            authenticate_handler: None,
            access_token_lifetime: 1800,
            authorization_code_lifetime: 300,
            allow_empty_state: false,
        }
    }
}

/// The parsed, format-checked authorization request.
struct AuthorizationRequest {
    response_type: ResponseKind,
    redirect_uri: String,
    client_id: String,
    scope: Option<String>,
    state: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ResponseKind {
    Code,
    Token,
}

pub struct AuthorizeEndpoint {
    model: Arc<dyn Model>,
    options: AuthorizeOptions,
}

impl AuthorizeEndpoint {
    pub fn new(model: Arc<dyn Model>, options: AuthorizeOptions) -> Self {
        AuthorizeEndpoint { model, options }
    }

    /// Run the authorization pipeline and populate `response` with the
    /// success redirect, or with the error shape of RFC 6749 §4.1.2.1.
    #[instrument(skip(self, request, response), level = "debug")]
    pub async fn execute(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<(), OAuthError> {
        match self.handle(request, response).await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.fail(request, response, &error);
                Err(error)
            }
        }
    }

    async fn handle(&self, request: &Request, response: &mut Response) -> Result<(), OAuthError> {
        let auth_request = self.parse(request)?;
        let user = self.authenticate_user(request, response).await?;
        let client = self.load_client(&auth_request).await?;
        let scope = self
            .model
            .validate_scope(&user, &client, auth_request.scope.as_deref())
            .await?;

        let location = match auth_request.response_type {
            ResponseKind::Code => {
                let code = self
                    .issue_code(&auth_request, &client, &user, scope.as_deref())
                    .await?;
                code_redirect(&auth_request.redirect_uri, &code, auth_request.state.as_deref())?
            }
            ResponseKind::Token => {
                let lifetime = client
                    .access_token_lifetime
                    .unwrap_or(self.options.access_token_lifetime);
                let token = ImplicitGrant::new(self.model.clone(), lifetime)
                    .execute(&client, &user, scope.as_deref())
                    .await?;
                token_redirect(
                    &auth_request.redirect_uri,
                    &token,
                    auth_request.state.as_deref(),
                )?
            }
        };
        response.redirect(&location);
        Ok(())
    }

    fn parse(&self, request: &Request) -> Result<AuthorizationRequest, OAuthError> {
        if request.query_param("allowed") == Some("false") {
            return Err(OAuthError::access_denied(
                "Access denied: user denied access to application",
            ));
        }

        let response_type = request
            .param("response_type")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `response_type`"))?;
        let response_type = match response_type {
            "code" => ResponseKind::Code,
            "token" => ResponseKind::Token,
            _ => {
                return Err(OAuthError::unsupported_response_type(
                    "Unsupported response type: `response_type` is not supported",
                ));
            }
        };

        let redirect_uri = request
            .param("redirect_uri")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `redirect_uri`"))?;
        if !validators::is_uri(redirect_uri) {
            return Err(OAuthError::invalid_request(
                "Invalid request: `redirect_uri` is not a valid URI",
            ));
        }

        let client_id = request
            .param("client_id")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `client_id`"))?;
        if !validators::is_vschar(client_id) {
            return Err(OAuthError::invalid_request("Invalid parameter: `client_id`"));
        }

        let scope = request.param("scope");
        if let Some(scope) = scope {
            if !validators::is_nqschar(scope) {
                return Err(OAuthError::invalid_scope("Invalid parameter: `scope`"));
            }
        }

        let state = request.param("state");
        if state.is_none() && !self.options.allow_empty_state {
            return Err(OAuthError::invalid_request("Missing parameter: `state`"));
        }
        if let Some(state) = state {
            if !validators::is_vschar(state) {
                return Err(OAuthError::invalid_request("Invalid parameter: `state`"));
            }
        }

        Ok(AuthorizationRequest {
            response_type,
            redirect_uri: redirect_uri.to_string(),
            client_id: client_id.to_string(),
            scope: scope.map(str::to_string),
            state: state.map(str::to_string),
        })
    }

    async fn authenticate_user(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<User, OAuthError> {
        let user = match &self.options.authenticate_handler {
            Some(handler) => handler.execute(request, response).await?,
            None => {
                let endpoint = AuthenticateEndpoint::new(
                    self.model.clone(),
                    AuthenticateOptions::default(),
                );
                Some(endpoint.execute(request, response).await?)
            }
        };
        user.ok_or_else(|| {
            OAuthError::server_error("Server error: authentication did not return a user")
        })
    }

    async fn load_client(
        &self,
        auth_request: &AuthorizationRequest,
    ) -> Result<Client, OAuthError> {
        let client = self
            .model
            .get_client(&auth_request.client_id, None)
            .await?
            .ok_or_else(|| {
                OAuthError::invalid_client("Invalid client: client credentials are invalid")
            })?;
        if client.grants.is_empty() {
            return Err(OAuthError::invalid_client(
                "Invalid client: missing client `grants`",
            ));
        }
        let required_grant = match auth_request.response_type {
            ResponseKind::Code => "authorization_code",
            ResponseKind::Token => "implicit",
        };
        if !client.grants.iter().any(|grant| grant == required_grant) {
            return Err(OAuthError::unauthorized_client(
                "Unauthorized client: `grant_type` is invalid",
            ));
        }
        if client.redirect_uris.is_empty() {
            return Err(OAuthError::invalid_client(
                "Invalid client: missing client `redirect_uri`",
            ));
        }
        if !client.redirect_uris.contains(&auth_request.redirect_uri) {
            return Err(OAuthError::invalid_client(
                "Invalid client: `redirect_uri` does not match a registered value",
            ));
        }
        Ok(client)
    }

    async fn issue_code(
        &self,
        auth_request: &AuthorizationRequest,
        client: &Client,
        user: &User,
        scope: Option<&str>,
    ) -> Result<AuthorizationCode, OAuthError> {
        let lifetime = client
            .authorization_code_lifetime
            .unwrap_or(self.options.authorization_code_lifetime);
        let value =
            base::generate_authorization_code(self.model.as_ref(), client, user, scope).await?;
        let code = AuthorizationCode {
            authorization_code: value,
            client: client.clone(),
            user: user.clone(),
            scope: scope.map(str::to_string),
            redirect_uri: Some(auth_request.redirect_uri.clone()),
            expires_at: base::expiry(lifetime),
        };
        self.model.save_authorization_code(code).await
    }

    /// RFC 6749 §4.1.2.1: `invalid_client` and `unauthorized_request`
    /// never redirect; everything else bounces back to the requested
    /// `redirect_uri` when one was supplied.
    fn fail(&self, request: &Request, response: &mut Response, error: &OAuthError) {
        write_error(response, error);
        if matches!(
            error,
            OAuthError::InvalidClient(_) | OAuthError::UnauthorizedRequest(_)
        ) {
            response.set_status(401);
            return;
        }
        // The raw request value, not the validated client: the engine
        // does not guess a redirect target the request never named.
        if let Some(uri) = request.param("redirect_uri") {
            if validators::is_uri(uri) {
                if let Ok(location) = error_redirect(uri, error) {
                    response.redirect(&location);
                }
            }
        }
    }
}

/// Success redirect for the code flow: the requested URI with its query
/// replaced by `code`, then `scope`, then `state`.
fn code_redirect(
    redirect_uri: &str,
    code: &AuthorizationCode,
    state: Option<&str>,
) -> Result<String, OAuthError> {
    let mut url = parse_redirect(redirect_uri)?;
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("code", &code.authorization_code);
        if let Some(scope) = &code.scope {
            pairs.append_pair("scope", scope);
        }
        if let Some(state) = state {
            pairs.append_pair("state", state);
        }
    }
    Ok(url.to_string())
}

/// Success redirect for the implicit flow: token parameters appended to
/// the existing fragment.
fn token_redirect(
    redirect_uri: &str,
    token: &Token,
    state: Option<&str>,
) -> Result<String, OAuthError> {
    let mut url = parse_redirect(redirect_uri)?;
    let mut pairs = form_urlencoded::Serializer::new(String::new());
    pairs.append_pair("access_token", &token.access_token);
    if let Some(expires_in) = token.access_token_lifetime() {
        pairs.append_pair("expires_in", &expires_in.to_string());
    }
    if let Some(state) = state {
        pairs.append_pair("state", state);
    }
    let params = pairs.finish();
    let fragment = match url.fragment() {
        Some(existing) if !existing.is_empty() => format!("{existing}&{params}"),
        _ => params,
    };
    url.set_fragment(Some(&fragment));
    Ok(url.to_string())
}

/// Error redirect: the requested URI with its query replaced by `error`
/// and `error_description`.
fn error_redirect(redirect_uri: &str, error: &OAuthError) -> Result<String, OAuthError> {
    let mut url = parse_redirect(redirect_uri)?;
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("error", error.name());
        pairs.append_pair("error_description", error.description());
    }
    Ok(url.to_string())
}

fn parse_redirect(redirect_uri: &str) -> Result<Url, OAuthError> {
    Url::parse(redirect_uri).map_err(|_| {
        OAuthError::invalid_request("Invalid request: `redirect_uri` is not a valid URI")
    })
}
