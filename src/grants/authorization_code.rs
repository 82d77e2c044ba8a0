//! Authorization code grant (RFC 6749 §4.1): redeem a single-use code
//! for an access + refresh token pair.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Map;
use tracing::instrument;

use super::base;
use super::GrantType;
use crate::error::OAuthError;
use crate::model::Model;
use crate::request::Request;
use crate::types::{AuthorizationCode, Client, Token};
use crate::validators;

pub struct AuthorizationCodeGrant {
    model: Arc<dyn Model>,
    access_token_lifetime: u64,
    refresh_token_lifetime: u64,
}

impl AuthorizationCodeGrant {
    pub fn new(
        model: Arc<dyn Model>,
        access_token_lifetime: u64,
        refresh_token_lifetime: u64,
    ) -> Self {
        AuthorizationCodeGrant {
            model,
            access_token_lifetime,
            refresh_token_lifetime,
        }
    }

    async fn load_code(
        &self,
        request: &Request,
        client: &Client,
    ) -> Result<AuthorizationCode, OAuthError> {
        let value = request
            .param("code")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `code`"))?;
        if !validators::is_vschar(value) {
            return Err(OAuthError::invalid_request("Invalid parameter: `code`"));
        }
        let redirect_uri = request.param("redirect_uri");
        if let Some(uri) = redirect_uri {
            if !validators::is_uri(uri) {
                return Err(OAuthError::invalid_request(
                    "Invalid request: `redirect_uri` is not a valid URI",
                ));
            }
        }

        let code = self
            .model
            .get_authorization_code(value)
            .await?
            .ok_or_else(|| {
                OAuthError::invalid_grant("Invalid grant: authorization code is invalid")
            })?;
        if code.client.id != client.id {
            return Err(OAuthError::invalid_grant(
                "Invalid grant: authorization code was issued to another client",
            ));
        }
        if code.expires_at <= Utc::now() {
            return Err(OAuthError::invalid_grant(
                "Invalid grant: authorization code has expired",
            ));
        }
        // A code bound to a redirect URI must be redeemed with the exact
        // same URI.
        if let Some(expected) = &code.redirect_uri {
            if redirect_uri != Some(expected.as_str()) {
                return Err(OAuthError::invalid_request(
                    "Invalid request: `redirect_uri` is invalid",
                ));
            }
        }
        Ok(code)
    }
}

#[async_trait]
impl GrantType for AuthorizationCodeGrant {
    #[instrument(skip(self, request, client), level = "debug")]
    async fn execute(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        let code = self.load_code(request, client).await?;

        // Single use: the code must be gone before the token exists.
        if !self.model.revoke_authorization_code(&code).await? {
            return Err(OAuthError::invalid_grant(
                "Invalid grant: authorization code is invalid",
            ));
        }

        let scope = code.scope.clone();
        let access_token_lifetime = client
            .access_token_lifetime
            .unwrap_or(self.access_token_lifetime);
        let refresh_token_lifetime = client
            .refresh_token_lifetime
            .unwrap_or(self.refresh_token_lifetime);

        let token = Token {
            access_token: base::generate_access_token(
                self.model.as_ref(),
                client,
                &code.user,
                scope.as_deref(),
            )
            .await?,
            access_token_expires_at: Some(base::expiry(access_token_lifetime)),
            refresh_token: Some(
                base::generate_refresh_token(
                    self.model.as_ref(),
                    client,
                    &code.user,
                    scope.as_deref(),
                )
                .await?,
            ),
            refresh_token_expires_at: Some(base::expiry(refresh_token_lifetime)),
            scope,
            client: client.clone(),
            user: code.user.clone(),
            extra: Map::new(),
        };
        self.model.save_token(token).await
    }
}
