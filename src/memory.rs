//! In-memory reference implementation of the [`Model`] seam.
//!
//! Good enough to prototype a host or drive the test suites; everything
//! lives in process-local concurrent maps.

use dashmap::DashMap;

use async_trait::async_trait;

use crate::error::OAuthError;
use crate::model::Model;
use crate::types::{AuthorizationCode, Client, Token, User};

/// Concurrent-map backed Model.
#[derive(Default)]
pub struct InMemoryModel {
    clients: DashMap<String, Client>,
    client_owners: DashMap<String, User>,
    users: DashMap<String, (String, User)>,
    codes: DashMap<String, AuthorizationCode>,
    access_tokens: DashMap<String, Token>,
    refresh_tokens: DashMap<String, Token>,
}

impl InMemoryModel {
    pub fn new() -> Self {
        InMemoryModel::default()
    }

    /// Register a client.
    pub fn add_client(&self, client: Client) {
        self.clients.insert(client.id.clone(), client);
    }

    /// Register a resource owner with the password `get_user` checks.
    pub fn add_user(&self, user: User, password: impl Into<String>) {
        self.users
            .insert(user.username.clone(), (password.into(), user));
    }

    /// Tie a user to a client for the client_credentials grant.
    pub fn set_client_owner(&self, client_id: impl Into<String>, user: User) {
        self.client_owners.insert(client_id.into(), user);
    }
}

#[async_trait]
impl Model for InMemoryModel {
    async fn get_client(
        &self,
        id: &str,
        secret: Option<&str>,
    ) -> Result<Option<Client>, OAuthError> {
        let Some(client) = self.clients.get(id).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        if let Some(secret) = secret {
            if client.secret.as_deref() != Some(secret) {
                return Ok(None);
            }
        }
        Ok(Some(client))
    }

    async fn get_user(&self, username: &str, password: &str) -> Result<Option<User>, OAuthError> {
        Ok(self.users.get(username).and_then(|entry| {
            let (stored, user) = entry.value();
            (stored == password).then(|| user.clone())
        }))
    }

    async fn get_user_from_client(&self, client: &Client) -> Result<Option<User>, OAuthError> {
        Ok(self
            .client_owners
            .get(&client.id)
            .map(|entry| entry.value().clone()))
    }

    async fn verify_scope(&self, token: &Token, scope: &str) -> Result<bool, OAuthError> {
        let granted: Vec<&str> = token
            .scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default();
        Ok(scope.split_whitespace().all(|s| granted.contains(&s)))
    }

    async fn save_authorization_code(
        &self,
        code: AuthorizationCode,
    ) -> Result<AuthorizationCode, OAuthError> {
        self.codes
            .insert(code.authorization_code.clone(), code.clone());
        Ok(code)
    }

    async fn get_authorization_code(
        &self,
        code: &str,
    ) -> Result<Option<AuthorizationCode>, OAuthError> {
        Ok(self.codes.get(code).map(|entry| entry.value().clone()))
    }

    async fn revoke_authorization_code(
        &self,
        code: &AuthorizationCode,
    ) -> Result<bool, OAuthError> {
        Ok(self.codes.remove(&code.authorization_code).is_some())
    }

    async fn save_token(&self, token: Token) -> Result<Token, OAuthError> {
        self.access_tokens
            .insert(token.access_token.clone(), token.clone());
        if let Some(refresh_token) = &token.refresh_token {
            self.refresh_tokens.insert(refresh_token.clone(), token.clone());
        }
        Ok(token)
    }

    async fn get_access_token(&self, token: &str) -> Result<Option<Token>, OAuthError> {
        Ok(self
            .access_tokens
            .get(token)
            .map(|entry| entry.value().clone()))
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<Token>, OAuthError> {
        Ok(self
            .refresh_tokens
            .get(token)
            .map(|entry| entry.value().clone()))
    }

    async fn revoke_access_token(&self, token: &Token) -> Result<bool, OAuthError> {
        Ok(self.access_tokens.remove(&token.access_token).is_some())
    }

    async fn revoke_refresh_token(&self, token: &Token) -> Result<bool, OAuthError> {
        Ok(token
            .refresh_token
            .as_ref()
            .is_some_and(|refresh_token| self.refresh_tokens.remove(refresh_token).is_some()))
    }
}
