//! Introspection endpoint (RFC 7662): a resource server asks whether a
//! token is active and for its metadata.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::instrument;

use super::{
    read_client_credentials, read_token_and_hint, require_form_post, write_client_error,
    TokenHint,
};
use crate::error::OAuthError;
use crate::model::Model;
use crate::request::Request;
use crate::response::Response;
use crate::types::{non_empty, Client, IntrospectionResponse, Token};

/// Options for [`IntrospectEndpoint`].
#[derive(Debug, Clone)]
pub struct IntrospectOptions {
    /// Require a client secret alongside the client id.
    pub is_client_secret_required: bool,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        IntrospectOptions {
            is_client_secret_required: true,
        }
    }
}

pub struct IntrospectEndpoint {
    model: Arc<dyn Model>,
    options: IntrospectOptions,
}

impl IntrospectEndpoint {
    pub fn new(model: Arc<dyn Model>, options: IntrospectOptions) -> Self {
        IntrospectEndpoint { model, options }
    }

    /// Run the introspection pipeline; the RFC 7662 body ends up on
    /// `response`.
    #[instrument(skip(self, request, response), level = "debug")]
    pub async fn execute(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<(), OAuthError> {
        response.set_header("cache-control", "no-store");
        response.set_header("pragma", "no-cache");
        match self.handle(request).await {
            Ok(introspection) => {
                match serde_json::to_value(&introspection) {
                    Ok(Value::Object(map)) => {
                        response.set_body(map);
                        Ok(())
                    }
                    _ => {
                        let error = OAuthError::server_error(
                            "Server error: introspection serialization failed",
                        );
                        write_client_error(request, response, &error);
                        Err(error)
                    }
                }
            }
            Err(error) => {
                write_client_error(request, response, &error);
                Err(error)
            }
        }
    }

    async fn handle(&self, request: &Request) -> Result<IntrospectionResponse, OAuthError> {
        require_form_post(request)?;
        let (value, hint) = read_token_and_hint(request)?;
        let client = self.authenticate_client(request).await?;

        let token = match hint {
            TokenHint::AccessToken => self.model.get_access_token(&value).await?,
            TokenHint::RefreshToken => self.model.get_refresh_token(&value).await?,
        };
        // Unknown, foreign and expired tokens all read as plain inactive;
        // RFC 7662 §2.2 forbids leaking more than that.
        let Some(token) = token else {
            return Ok(IntrospectionResponse::inactive());
        };
        if token.client.id != client.id {
            return Ok(IntrospectionResponse::inactive());
        }
        let expires_at = match hint {
            TokenHint::AccessToken => token.access_token_expires_at,
            TokenHint::RefreshToken => token.refresh_token_expires_at,
        };
        if expires_at.is_some_and(|at| at <= Utc::now()) {
            return Ok(IntrospectionResponse::inactive());
        }
        Ok(active_response(&token, expires_at.map(|at| at.timestamp())))
    }

    async fn authenticate_client(&self, request: &Request) -> Result<Client, OAuthError> {
        let credentials =
            read_client_credentials(request, self.options.is_client_secret_required)?;
        self.model
            .get_client(
                &credentials.client_id,
                credentials.client_secret.as_deref(),
            )
            .await?
            .ok_or_else(|| OAuthError::invalid_client("Invalid client: client is invalid"))
    }
}

fn active_response(token: &Token, expires_at: Option<i64>) -> IntrospectionResponse {
    IntrospectionResponse {
        active: true,
        client_id: Some(token.client.id.clone()),
        username: Some(token.user.username.clone()),
        scope: non_empty(token.scope.as_deref()),
        expires_at,
    }
}
