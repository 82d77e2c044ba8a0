//! Token endpoint (RFC 6749 §3.2): authenticates the client, dispatches
//! the grant flow and answers with an RFC 6750 Bearer body.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use super::{read_client_credentials, require_form_post, write_client_error};
use crate::error::OAuthError;
use crate::grants::{
    AuthorizationCodeGrant, ClientCredentialsGrant, GrantType, PasswordGrant, RefreshTokenGrant,
};
use crate::model::Model;
use crate::request::Request;
use crate::response::Response;
use crate::types::{BearerToken, Client};
use crate::validators;

const STANDARD_GRANT_TYPES: [&str; 4] = [
    "authorization_code",
    "client_credentials",
    "password",
    "refresh_token",
];

/// Options for [`TokenEndpoint`].
#[derive(Clone)]
pub struct TokenOptions {
    /// Default access token lifetime, seconds.
    pub access_token_lifetime: u64,
    /// Default refresh token lifetime, seconds.
    pub refresh_token_lifetime: u64,
    /// Copy Model-attached extended attributes onto the wire body.
    pub allow_extended_token_attributes: bool,
    /// Per-grant-type client authentication policy; grants not listed
    /// require a secret.
    pub require_client_authentication: HashMap<String, bool>,
    /// Rotate refresh tokens on every refresh_token exchange.
    pub always_issue_new_refresh_token: bool,
    /// Extension grants, keyed by their wire `grant_type` identifier.
    pub extended_grant_types: HashMap<String, Arc<dyn GrantType>>,
}

impl Default for TokenOptions {
    fn default() -> Self {
        TokenOptions {
            access_token_lifetime: 1800,
            refresh_token_lifetime: 86400,
            allow_extended_token_attributes: false,
            require_client_authentication: HashMap::new(),
            always_issue_new_refresh_token: true,
            extended_grant_types: HashMap::new(),
        }
    }
}

impl TokenOptions {
    fn secret_required_for(&self, grant_type: &str) -> bool {
        *self
            .require_client_authentication
            .get(grant_type)
            .unwrap_or(&true)
    }
}

pub struct TokenEndpoint {
    model: Arc<dyn Model>,
    options: TokenOptions,
}

impl TokenEndpoint {
    pub fn new(model: Arc<dyn Model>, options: TokenOptions) -> Self {
        TokenEndpoint { model, options }
    }

    /// Run the token pipeline; on success the Bearer body and cache
    /// headers are on `response`.
    #[instrument(skip(self, request, response), level = "debug")]
    pub async fn execute(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<(), OAuthError> {
        set_bearer_headers(response);
        match self.handle(request).await {
            Ok(bearer) => {
                let body = match serde_json::to_value(&bearer) {
                    Ok(Value::Object(map)) => map,
                    _ => {
                        let error =
                            OAuthError::server_error("Server error: token serialization failed");
                        write_client_error(request, response, &error);
                        return Err(error);
                    }
                };
                response.set_body(body);
                Ok(())
            }
            Err(error) => {
                write_client_error(request, response, &error);
                Err(error)
            }
        }
    }

    async fn handle(&self, request: &Request) -> Result<BearerToken, OAuthError> {
        require_form_post(request)?;
        let grant_type = self.read_grant_type(request)?;
        let client = self.authenticate_client(request, &grant_type).await?;

        debug!(grant_type = %grant_type, client = %client.id, "dispatching grant");
        let token = self.dispatch(&grant_type, request, &client).await?;
        Ok(BearerToken::new(
            &token,
            self.options.allow_extended_token_attributes,
        ))
    }

    fn read_grant_type(&self, request: &Request) -> Result<String, OAuthError> {
        let grant_type = request
            .body_param("grant_type")
            .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `grant_type`"))?;
        // Extension grants are identified by absolute URIs.
        if !validators::is_nchar(grant_type) && !validators::is_uri(grant_type) {
            return Err(OAuthError::invalid_request("Invalid parameter: `grant_type`"));
        }
        let known = STANDARD_GRANT_TYPES.contains(&grant_type)
            || self.options.extended_grant_types.contains_key(grant_type);
        if !known {
            return Err(OAuthError::unsupported_grant_type(
                "Unsupported grant type: `grant_type` is invalid",
            ));
        }
        Ok(grant_type.to_string())
    }

    async fn authenticate_client(
        &self,
        request: &Request,
        grant_type: &str,
    ) -> Result<Client, OAuthError> {
        let credentials =
            read_client_credentials(request, self.options.secret_required_for(grant_type))?;
        let client = self
            .model
            .get_client(
                &credentials.client_id,
                credentials.client_secret.as_deref(),
            )
            .await?
            .ok_or_else(|| OAuthError::invalid_client("Invalid client: client is invalid"))?;
        if client.grants.is_empty() {
            return Err(OAuthError::server_error(
                "Server error: missing client `grants`",
            ));
        }
        if !client.grants.iter().any(|grant| grant == grant_type) {
            return Err(OAuthError::unauthorized_client(
                "Unauthorized client: `grant_type` is invalid",
            ));
        }
        Ok(client)
    }

    async fn dispatch(
        &self,
        grant_type: &str,
        request: &Request,
        client: &Client,
    ) -> Result<crate::types::Token, OAuthError> {
        let options = &self.options;
        match grant_type {
            "authorization_code" => {
                AuthorizationCodeGrant::new(
                    self.model.clone(),
                    options.access_token_lifetime,
                    options.refresh_token_lifetime,
                )
                .execute(request, client)
                .await
            }
            "client_credentials" => {
                ClientCredentialsGrant::new(self.model.clone(), options.access_token_lifetime)
                    .execute(request, client)
                    .await
            }
            "password" => {
                PasswordGrant::new(
                    self.model.clone(),
                    options.access_token_lifetime,
                    options.refresh_token_lifetime,
                )
                .execute(request, client)
                .await
            }
            "refresh_token" => {
                RefreshTokenGrant::new(
                    self.model.clone(),
                    options.access_token_lifetime,
                    options.refresh_token_lifetime,
                    options.always_issue_new_refresh_token,
                )
                .execute(request, client)
                .await
            }
            extension => {
                // read_grant_type vouched for the key.
                let grant = options.extended_grant_types.get(extension).ok_or_else(|| {
                    OAuthError::server_error("Server error: extension grant disappeared")
                })?;
                grant.execute(request, client).await
            }
        }
    }
}

fn set_bearer_headers(response: &mut Response) {
    response.set_header("content-type", "application/json;charset=UTF-8");
    response.set_header("cache-control", "no-store");
    response.set_header("pragma", "no-cache");
}
