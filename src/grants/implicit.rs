//! Implicit grant (RFC 6749 §4.2), driven only by the Authorize
//! endpoint's `token` response type. Access token only.

use std::sync::Arc;

use serde_json::Map;
use tracing::instrument;

use super::base;
use crate::error::OAuthError;
use crate::model::Model;
use crate::types::{Client, Token, User};

pub struct ImplicitGrant {
    model: Arc<dyn Model>,
    access_token_lifetime: u64,
}

impl ImplicitGrant {
    pub fn new(model: Arc<dyn Model>, access_token_lifetime: u64) -> Self {
        ImplicitGrant {
            model,
            access_token_lifetime,
        }
    }

    /// Issue an access token straight to an authenticated resource owner.
    ///
    /// Unlike the token-endpoint grants there is no request to parse:
    /// user, client and validated scope come from the Authorize pipeline.
    #[instrument(skip(self, client, user), level = "debug")]
    pub async fn execute(
        &self,
        client: &Client,
        user: &User,
        scope: Option<&str>,
    ) -> Result<Token, OAuthError> {
        let access_token_lifetime = client
            .access_token_lifetime
            .unwrap_or(self.access_token_lifetime);

        let token = Token {
            access_token: base::generate_access_token(self.model.as_ref(), client, user, scope)
                .await?,
            access_token_expires_at: Some(base::expiry(access_token_lifetime)),
            refresh_token: None,
            refresh_token_expires_at: None,
            scope: scope.map(str::to_string),
            client: client.clone(),
            user: user.clone(),
            extra: Map::new(),
        };
        self.model.save_token(token).await
    }
}
