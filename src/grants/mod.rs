//! Grant flows: one module per grant type plus the shared issuance
//! helpers they are built from.

pub mod authorization_code;
pub mod client_credentials;
pub mod implicit;
pub mod password;
pub mod refresh_token;

pub(crate) mod base;

pub use authorization_code::AuthorizationCodeGrant;
pub use client_credentials::ClientCredentialsGrant;
pub use implicit::ImplicitGrant;
pub use password::PasswordGrant;
pub use refresh_token::RefreshTokenGrant;

use async_trait::async_trait;

use crate::error::OAuthError;
use crate::request::Request;
use crate::types::{Client, Token};

/// A token-endpoint grant flow.
///
/// The standard grants implement this, and hosts register additional
/// implementations under extension grant-type identifiers (NCHAR names or
/// absolute URIs) with the server façade.
#[async_trait]
pub trait GrantType: Send + Sync {
    /// Run the flow for an already-authenticated client and return the
    /// persisted token.
    async fn execute(&self, request: &Request, client: &Client) -> Result<Token, OAuthError>;
}
