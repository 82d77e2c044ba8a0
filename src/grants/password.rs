//! Resource owner password credentials grant (RFC 6749 §4.3).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;
use tracing::instrument;

use super::base;
use super::GrantType;
use crate::error::OAuthError;
use crate::model::Model;
use crate::request::Request;
use crate::types::{Client, Token};
use crate::validators;

pub struct PasswordGrant {
    model: Arc<dyn Model>,
    access_token_lifetime: u64,
    refresh_token_lifetime: u64,
}

impl PasswordGrant {
    pub fn new(
        model: Arc<dyn Model>,
        access_token_lifetime: u64,
        refresh_token_lifetime: u64,
    ) -> Self {
        PasswordGrant {
            model,
            access_token_lifetime,
            refresh_token_lifetime,
        }
    }
}

fn required_uchar<'a>(request: &'a Request, name: &str) -> Result<&'a str, OAuthError> {
    let value = request
        .body_param(name)
        .ok_or_else(|| OAuthError::invalid_request(format!("Missing parameter: `{name}`")))?;
    if !validators::is_uchar(value) {
        return Err(OAuthError::invalid_request(format!(
            "Invalid parameter: `{name}`"
        )));
    }
    Ok(value)
}

#[async_trait]
impl GrantType for PasswordGrant {
    #[instrument(skip(self, request, client), level = "debug")]
    async fn execute(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        let username = required_uchar(request, "username")?;
        let password = required_uchar(request, "password")?;

        let user = self
            .model
            .get_user(username, password)
            .await?
            .ok_or_else(|| {
                OAuthError::invalid_grant("Invalid grant: user credentials are invalid")
            })?;

        let requested = base::read_scope(request)?;
        let scope = self
            .model
            .validate_scope(&user, client, requested.as_deref())
            .await?;

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
                &user,
                scope.as_deref(),
            )
            .await?,
            access_token_expires_at: Some(base::expiry(access_token_lifetime)),
            refresh_token: Some(
                base::generate_refresh_token(
                    self.model.as_ref(),
                    client,
                    &user,
                    scope.as_deref(),
                )
                .await?,
            ),
            refresh_token_expires_at: Some(base::expiry(refresh_token_lifetime)),
            scope,
            client: client.clone(),
            user,
            extra: Map::new(),
        };
        self.model.save_token(token).await
    }
}
