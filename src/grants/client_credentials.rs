//! Client credentials grant (RFC 6749 §4.4): a confidential client
//! obtains a token for itself. No refresh token is ever issued.

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

pub struct ClientCredentialsGrant {
    model: Arc<dyn Model>,
    access_token_lifetime: u64,
}

impl ClientCredentialsGrant {
    pub fn new(model: Arc<dyn Model>, access_token_lifetime: u64) -> Self {
        ClientCredentialsGrant {
            model,
            access_token_lifetime,
        }
    }
}

#[async_trait]
impl GrantType for ClientCredentialsGrant {
    #[instrument(skip(self, request, client), level = "debug")]
    async fn execute(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        let user = self
            .model
            .get_user_from_client(client)
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

        let token = Token {
            access_token: base::generate_access_token(
                self.model.as_ref(),
                client,
                &user,
                scope.as_deref(),
            )
            .await?,
            access_token_expires_at: Some(base::expiry(access_token_lifetime)),
            refresh_token: None,
            refresh_token_expires_at: None,
            scope,
            client: client.clone(),
            user,
            extra: Map::new(),
        };
        self.model.save_token(token).await
    }
}
