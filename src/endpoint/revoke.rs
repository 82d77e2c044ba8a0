//! Revocation endpoint (RFC 7009): a client invalidates a token it was
//! issued.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::{
    read_client_credentials, read_token_and_hint, require_form_post, write_client_error,
    TokenHint,
};
use crate::error::OAuthError;
use crate::model::Model;
use crate::request::Request;
use crate::response::Response;
use crate::types::Client;

/// Options for [`RevokeEndpoint`].
#[derive(Debug, Clone)]
pub struct RevokeOptions {
    /// Require a client secret alongside the client id.
    pub is_client_secret_required: bool,
}

impl Default for RevokeOptions {
    fn default() -> Self {
        RevokeOptions {
            is_client_secret_required: true,
        }
    }
}

pub struct RevokeEndpoint {
    model: Arc<dyn Model>,
    options: RevokeOptions,
}

impl RevokeEndpoint {
    pub fn new(model: Arc<dyn Model>, options: RevokeOptions) -> Self {
        RevokeEndpoint { model, options }
    }

    /// Run the revocation pipeline.
    ///
    /// Per RFC 7009 §2.2 an authenticated caller always gets 200 with an
    /// empty body, whether or not the token existed or was theirs; only
    /// parse and authentication failures surface.
    #[instrument(skip(self, request, response), level = "debug")]
    pub async fn execute(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<(), OAuthError> {
        match self.handle(request).await {
            Ok(()) => {
                response.set_status(200);
                Ok(())
            }
            Err(error) => {
                write_client_error(request, response, &error);
                Err(error)
            }
        }
    }

    async fn handle(&self, request: &Request) -> Result<(), OAuthError> {
        require_form_post(request)?;
        let (value, hint) = read_token_and_hint(request)?;
        let client = self.authenticate_client(request).await?;

        match hint {
            TokenHint::AccessToken => {
                if let Some(token) = self.model.get_access_token(&value).await? {
                    if token.client.id == client.id {
                        let revoked = self.model.revoke_access_token(&token).await?;
                        debug!(client = %client.id, revoked, "access token revocation");
                    }
                }
            }
            TokenHint::RefreshToken => {
                if let Some(token) = self.model.get_refresh_token(&value).await? {
                    if token.client.id == client.id {
                        let revoked = self.model.revoke_refresh_token(&token).await?;
                        debug!(client = %client.id, revoked, "refresh token revocation");
                    }
                }
            }
        }
        Ok(())
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
