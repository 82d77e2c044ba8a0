//! Refresh token grant (RFC 6749 §6), with optional rotation.

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
use crate::types::{Client, Token};
use crate::validators;

pub struct RefreshTokenGrant {
    model: Arc<dyn Model>,
    access_token_lifetime: u64,
    refresh_token_lifetime: u64,
    always_issue_new_refresh_token: bool,
}

impl RefreshTokenGrant {
    pub fn new(
        model: Arc<dyn Model>,
        access_token_lifetime: u64,
        refresh_token_lifetime: u64,
        always_issue_new_refresh_token: bool,
    ) -> Self {
        RefreshTokenGrant {
            model,
            access_token_lifetime,
            refresh_token_lifetime,
            always_issue_new_refresh_token,
        }
    }

    async fn load_token(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        let value = request
            .param("refresh_token")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `refresh_token`"))?;
        if !validators::is_vschar(value) {
            return Err(OAuthError::invalid_request(
                "Invalid parameter: `refresh_token`",
            ));
        }

        let token = self.model.get_refresh_token(value).await?.ok_or_else(|| {
            OAuthError::invalid_grant("Invalid grant: refresh token is invalid")
        })?;
        if token.client.id != client.id {
            return Err(OAuthError::invalid_grant(
                "Invalid grant: refresh token was issued to another client",
            ));
        }
        match token.refresh_token_expires_at {
            None => {
                return Err(OAuthError::invalid_grant(
                    "Invalid grant: refresh token has expired",
                ));
            }
            Some(expires_at) if expires_at <= Utc::now() => {
                return Err(OAuthError::invalid_grant(
                    "Invalid grant: refresh token has expired",
                ));
            }
            Some(_) => {}
        }
        Ok(token)
    }
}

#[async_trait]
impl GrantType for RefreshTokenGrant {
    #[instrument(skip(self, request, client), level = "debug")]
    async fn execute(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        let old_token = self.load_token(request, client).await?;

        // Rotation: the consumed refresh token must be revoked before its
        // replacement is saved.
        if self.always_issue_new_refresh_token {
            if !self.model.revoke_refresh_token(&old_token).await? {
                return Err(OAuthError::invalid_grant(
                    "Invalid grant: refresh token is invalid",
                ));
            }
        }

        // Scope comes from the consumed token, never from the form.
        let scope = old_token.scope.clone();
        let access_token_lifetime = client
            .access_token_lifetime
            .unwrap_or(self.access_token_lifetime);

        let mut token = Token {
            access_token: base::generate_access_token(
                self.model.as_ref(),
                client,
                &old_token.user,
                scope.as_deref(),
            )
            .await?,
            access_token_expires_at: Some(base::expiry(access_token_lifetime)),
            refresh_token: None,
            refresh_token_expires_at: None,
            scope,
            client: client.clone(),
            user: old_token.user.clone(),
            extra: Map::new(),
        };
        if self.always_issue_new_refresh_token {
            let refresh_token_lifetime = client
                .refresh_token_lifetime
                .unwrap_or(self.refresh_token_lifetime);
            token.refresh_token = Some(
                base::generate_refresh_token(
                    self.model.as_ref(),
                    client,
                    &old_token.user,
                    token.scope.as_deref(),
                )
                .await?,
            );
            token.refresh_token_expires_at = Some(base::expiry(refresh_token_lifetime));
        }
        self.model.save_token(token).await
    }
}
