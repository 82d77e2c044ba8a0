//! Bearer authentication endpoint (RFC 6750): validates the access token
//! presented on a request to a protected resource.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use super::write_error;
use crate::error::OAuthError;
use crate::model::Model;
use crate::request::Request;
use crate::response::Response;
use crate::types::{non_empty, Token, User};

/// Options for [`AuthenticateEndpoint`].
#[derive(Debug, Clone)]
pub struct AuthenticateOptions {
    /// Scope a protected resource requires; `None` skips verification.
    pub scope: Option<String>,
    /// Emit `X-Accepted-OAuth-Scopes` on success when a scope is
    /// required.
    pub add_accepted_scopes_header: bool,
    /// Emit `X-OAuth-Scopes` with the token's scope on success.
    pub add_authorized_scopes_header: bool,
    /// Accept `access_token` as a query parameter. Off per RFC 6750 §2.3
    /// unless the host opts in.
    pub allow_bearer_tokens_in_query_string: bool,
}

impl Default for AuthenticateOptions {
    fn default() -> Self {
        AuthenticateOptions {
            scope: None,
            add_accepted_scopes_header: true,
            add_authorized_scopes_header: true,
            allow_bearer_tokens_in_query_string: false,
        }
    }
}

pub struct AuthenticateEndpoint {
    model: Arc<dyn Model>,
    options: AuthenticateOptions,
}

impl AuthenticateEndpoint {
    pub fn new(model: Arc<dyn Model>, options: AuthenticateOptions) -> Self {
        AuthenticateEndpoint { model, options }
    }

    /// Validate the bearer token on `request` and return its user.
    ///
    /// On failure the response is shaped (401/403 plus a
    /// `WWW-Authenticate` challenge when no credentials were presented)
    /// and the error re-raised for the host to log.
    #[instrument(skip(self, request, response), level = "debug")]
    pub async fn execute(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<User, OAuthError> {
        match self.handle(request).await {
            Ok(token) => {
                self.write_success(response, &token);
                Ok(token.user)
            }
            Err(error) => {
                self.fail(response, &error);
                Err(error)
            }
        }
    }

    async fn handle(&self, request: &Request) -> Result<Token, OAuthError> {
        let value = self.read_token(request)?;

        let token = self
            .model
            .get_access_token(&value)
            .await?
            .ok_or_else(|| OAuthError::invalid_token("Invalid token: access token is invalid"))?;
        let expires_at = token.access_token_expires_at.ok_or_else(|| {
            OAuthError::server_error("Server error: `access_token_expires_at` must be set")
        })?;
        if expires_at <= Utc::now() {
            return Err(OAuthError::invalid_token(
                "Invalid token: access token has expired",
            ));
        }

        if let Some(required) = &self.options.scope {
            if !self.model.verify_scope(&token, required).await? {
                return Err(OAuthError::insufficient_scope(
                    "Insufficient scope: authorized scope is insufficient",
                ));
            }
        }
        Ok(token)
    }

    /// Locate the bearer token: `Authorization` header, query parameter
    /// or form body, exactly one of them.
    fn read_token(&self, request: &Request) -> Result<String, OAuthError> {
        let header = request.header("authorization");
        let query = request.query_param("access_token");
        let body = request.body_param("access_token");

        let presented = [header.is_some(), query.is_some(), body.is_some()]
            .iter()
            .filter(|p| **p)
            .count();
        if presented > 1 {
            return Err(OAuthError::invalid_request(
                "Invalid request: only one authentication method is allowed",
            ));
        }

        if let Some(value) = header {
            return match value.strip_prefix("Bearer ") {
                Some(token) if !token.is_empty() => Ok(token.to_string()),
                _ => Err(OAuthError::invalid_request(
                    "Invalid request: malformed authorization header",
                )),
            };
        }
        if let Some(token) = query {
            if !self.options.allow_bearer_tokens_in_query_string {
                return Err(OAuthError::invalid_request(
                    "Invalid request: do not send bearer tokens in query URLs",
                ));
            }
            return Ok(token.to_string());
        }
        if let Some(token) = body {
            if request.method() == "GET" {
                return Err(OAuthError::invalid_request(
                    "Invalid request: token may not be passed in the body of a GET request",
                ));
            }
            if !request.is_form_encoded() {
                return Err(OAuthError::invalid_request(
                    "Invalid request: content must be application/x-www-form-urlencoded",
                ));
            }
            return Ok(token.to_string());
        }
        Err(OAuthError::unauthorized_request(
            "Unauthorized request: no authentication given",
        ))
    }

    fn write_success(&self, response: &mut Response, token: &Token) {
        if let Some(required) = &self.options.scope {
            if self.options.add_accepted_scopes_header {
                response.set_header("x-accepted-oauth-scopes", required.clone());
            }
            if self.options.add_authorized_scopes_header {
                if let Some(scope) = non_empty(token.scope.as_deref()) {
                    response.set_header("x-oauth-scopes", scope);
                }
            }
        }
    }

    fn fail(&self, response: &mut Response, error: &OAuthError) {
        write_error(response, error);
        // RFC 6750 §3: a request with no credentials at all gets a bare
        // challenge.
        if matches!(error, OAuthError::UnauthorizedRequest(_)) {
            response.set_header("www-authenticate", "Bearer realm=\"Service\"");
        }
    }
}
