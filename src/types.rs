//! Domain records owned by the Model and the wire structs derived from
//! them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// An OAuth 2.0 client application.
#[derive(Debug, Clone)]
pub struct Client {
    /// Client identifier.
    pub id: String,
    /// Optional client secret; the Model verifies it, public clients have
    /// none.
    pub secret: Option<String>,
    /// Grant-type identifiers the client may use.
    pub grants: Vec<String>,
    /// Registered redirect URIs, exact-match on the wire.
    pub redirect_uris: Vec<String>,
    /// Per-client access token lifetime in seconds, overrides the server
    /// default.
    pub access_token_lifetime: Option<u64>,
    /// Per-client refresh token lifetime in seconds.
    pub refresh_token_lifetime: Option<u64>,
    /// Per-client authorization code lifetime in seconds.
    pub authorization_code_lifetime: Option<u64>,
}

/// A resource owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    /// Exposed by introspection responses.
    pub username: String,
}

/// A single-use credential redeemable for a token.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub authorization_code: String,
    pub client: Client,
    pub user: User,
    pub scope: Option<String>,
    /// When present, the redeeming request must repeat it exactly.
    pub redirect_uri: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// A persisted access token, possibly paired with a refresh token.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
    pub client: Client,
    pub user: User,
    /// Extended attributes the Model attached on save; copied onto the
    /// wire only when the Token endpoint allows them.
    pub extra: Map<String, Value>,
}

impl Token {
    /// Seconds of access-token life remaining, floored; `None` when the
    /// expiry is unknown.
    pub fn access_token_lifetime(&self) -> Option<u64> {
        self.access_token_expires_at.map(|expires_at| {
            let remaining = (expires_at - Utc::now()).num_seconds();
            remaining.max(0) as u64
        })
    }
}

/// RFC 6750 token response body.
#[derive(Debug, Clone, Serialize)]
pub struct BearerToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BearerToken {
    /// Shape the wire body from a persisted token. Extended attributes are
    /// carried over only when `allow_extended_attributes` is set.
    pub fn new(token: &Token, allow_extended_attributes: bool) -> Self {
        BearerToken {
            access_token: token.access_token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: token.access_token_lifetime(),
            refresh_token: token.refresh_token.clone(),
            scope: non_empty(token.scope.as_deref()),
            extra: if allow_extended_attributes {
                token.extra.clone()
            } else {
                Map::new()
            },
        }
    }
}

/// RFC 7662 introspection response body.
#[derive(Debug, Clone, Serialize)]
pub struct IntrospectionResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl IntrospectionResponse {
    pub fn inactive() -> Self {
        IntrospectionResponse {
            active: false,
            client_id: None,
            username: None,
            scope: None,
            expires_at: None,
        }
    }
}

/// Empty scope strings count as absent everywhere a scope is shaped onto
/// the wire.
pub(crate) fn non_empty(scope: Option<&str>) -> Option<String> {
    scope.filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Duration;

    fn client() -> Client {
        Client {
            id: "c1".into(),
            secret: Some("s1".into()),
            grants: vec!["password".into()],
            redirect_uris: vec![],
            access_token_lifetime: None,
            refresh_token_lifetime: None,
            authorization_code_lifetime: None,
        }
    }

    fn token(scope: Option<&str>) -> Token {
        Token {
            access_token: "at".into(),
            access_token_expires_at: Some(Utc::now() + Duration::seconds(1800)),
            refresh_token: None,
            refresh_token_expires_at: None,
            scope: scope.map(str::to_string),
            client: client(),
            user: User {
                id: "u1".into(),
                username: "alice".into(),
            },
            extra: Map::new(),
        }
    }

    #[test]
    fn lifetime_is_floored_seconds_remaining() {
        let lifetime = token(None).access_token_lifetime().unwrap();
        assert!((1798..=1800).contains(&lifetime));
    }

    #[test]
    fn expired_token_reports_zero_lifetime() {
        let mut token = token(None);
        token.access_token_expires_at = Some(Utc::now() - Duration::seconds(5));
        assert_eq!(token.access_token_lifetime(), Some(0));
    }

    #[test]
    fn bearer_token_drops_empty_scope() {
        let bearer = BearerToken::new(&token(Some("")), false);
        assert!(bearer.scope.is_none());
        let bearer = BearerToken::new(&token(Some("read")), false);
        assert_eq!(bearer.scope.as_deref(), Some("read"));
    }

    #[test]
    fn extended_attributes_are_gated() {
        let mut persisted = token(None);
        persisted
            .extra
            .insert("foo".into(), Value::String("bar".into()));
        assert!(BearerToken::new(&persisted, false).extra.is_empty());
        assert_eq!(BearerToken::new(&persisted, true).extra["foo"], "bar");
    }
}
