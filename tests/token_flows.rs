use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use oauth_service::{
    AuthorizationCode, Client, InMemoryModel, Model, OAuthError, OAuthServer, Request, Response,
    Token, TokenOverrides, User,
};

fn demo_client(grants: &[&str]) -> Client {
    Client {
        id: "c1".to_string(),
        secret: Some("s1".to_string()),
        grants: grants.iter().map(|g| g.to_string()).collect(),
        redirect_uris: vec!["https://app.local/cb".to_string()],
        access_token_lifetime: None,
        refresh_token_lifetime: None,
        authorization_code_lifetime: None,
    }
}

fn alice() -> User {
    User {
        id: "u1".to_string(),
        username: "alice".to_string(),
    }
}

fn setup(grants: &[&str]) -> (Arc<InMemoryModel>, OAuthServer) {
    let model = Arc::new(InMemoryModel::new());
    model.add_client(demo_client(grants));
    model.add_user(alice(), "pw");
    let server = OAuthServer::new(model.clone());
    (model, server)
}

fn token_request(params: &[(&str, &str)]) -> Request {
    let mut builder = Request::builder("POST").form_encoded();
    for (name, value) in params {
        builder = builder.body_param(*name, *value);
    }
    builder.build()
}

fn is_hex40(value: &str) -> bool {
    value.len() == 40 && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[tokio::test]
async fn password_grant_issues_bearer_token() {
    let (_, server) = setup(&["password"]);
    let request = token_request(&[
        ("grant_type", "password"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
        ("username", "alice"),
        ("password", "pw"),
        ("scope", "read"),
    ]);
    let mut response = Response::new();
    server.token(&request, &mut response, None).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.header("cache-control"), Some("no-store"));
    assert_eq!(response.header("pragma"), Some("no-cache"));
    assert_eq!(
        response.header("content-type"),
        Some("application/json;charset=UTF-8")
    );

    let body = response.body();
    assert!(is_hex40(body["access_token"].as_str().unwrap()));
    assert!(is_hex40(body["refresh_token"].as_str().unwrap()));
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["scope"], "read");
    let expires_in = body["expires_in"].as_u64().unwrap();
    assert!((1798..=1800).contains(&expires_in));
}

#[tokio::test]
async fn password_grant_rejects_wrong_credentials() {
    let (_, server) = setup(&["password"]);
    let request = token_request(&[
        ("grant_type", "password"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
        ("username", "alice"),
        ("password", "wrong"),
    ]);
    let mut response = Response::new();
    let error = server.token(&request, &mut response, None).await.unwrap_err();
    assert!(matches!(error, OAuthError::InvalidGrant(_)));
    assert_eq!(response.status(), 400);
    assert_eq!(response.body()["error"], "invalid_grant");
}

#[tokio::test]
async fn client_credentials_grant_never_issues_refresh_token() {
    let (model, server) = setup(&["client_credentials"]);
    model.set_client_owner("c1", alice());
    let request = token_request(&[
        ("grant_type", "client_credentials"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
        ("scope", "read"),
    ]);
    let mut response = Response::new();
    server.token(&request, &mut response, None).await.unwrap();

    let body = response.body();
    assert!(is_hex40(body["access_token"].as_str().unwrap()));
    assert!(body.get("refresh_token").is_none());
}

#[tokio::test]
async fn authorization_code_is_single_use() {
    let (model, server) = setup(&["authorization_code"]);
    let code = AuthorizationCode {
        authorization_code: "codeone".to_string(),
        client: demo_client(&["authorization_code"]),
        user: alice(),
        scope: Some("read".to_string()),
        redirect_uri: Some("https://app.local/cb".to_string()),
        expires_at: chrono::Utc::now() + chrono::Duration::seconds(300),
    };
    model.save_authorization_code(code).await.unwrap();

    let request = token_request(&[
        ("grant_type", "authorization_code"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
        ("code", "codeone"),
        ("redirect_uri", "https://app.local/cb"),
    ]);

    let mut response = Response::new();
    server.token(&request, &mut response, None).await.unwrap();
    assert_eq!(response.body()["scope"], "read");

    // Redeeming the same code again must fail: it was revoked with the
    // first issuance.
    let mut second = Response::new();
    let error = server.token(&request, &mut second, None).await.unwrap_err();
    assert!(matches!(error, OAuthError::InvalidGrant(_)));
    assert_eq!(second.status(), 400);
    assert_eq!(second.body()["error"], "invalid_grant");
}

#[tokio::test]
async fn authorization_code_checks_redirect_uri_and_expiry() {
    let (model, server) = setup(&["authorization_code"]);
    model
        .save_authorization_code(AuthorizationCode {
            authorization_code: "bound".to_string(),
            client: demo_client(&["authorization_code"]),
            user: alice(),
            scope: None,
            redirect_uri: Some("https://app.local/cb".to_string()),
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(300),
        })
        .await
        .unwrap();

    let request = token_request(&[
        ("grant_type", "authorization_code"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
        ("code", "bound"),
        ("redirect_uri", "https://evil.local/cb"),
    ]);
    let mut response = Response::new();
    let error = server.token(&request, &mut response, None).await.unwrap_err();
    assert!(matches!(error, OAuthError::InvalidRequest(_)));

    // `expires_at == now` counts as expired.
    model
        .save_authorization_code(AuthorizationCode {
            authorization_code: "stale".to_string(),
            client: demo_client(&["authorization_code"]),
            user: alice(),
            scope: None,
            redirect_uri: None,
            expires_at: chrono::Utc::now() - chrono::Duration::seconds(1),
        })
        .await
        .unwrap();
    let request = token_request(&[
        ("grant_type", "authorization_code"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
        ("code", "stale"),
    ]);
    let mut response = Response::new();
    let error = server.token(&request, &mut response, None).await.unwrap_err();
    assert!(matches!(error, OAuthError::InvalidGrant(_)));
}

/// Records the order of refresh-rotation Model calls.
struct RotationSpy {
    inner: InMemoryModel,
    calls: Mutex<Vec<&'static str>>,
}

#[async_trait]
impl Model for RotationSpy {
    async fn get_client(
        &self,
        id: &str,
        secret: Option<&str>,
    ) -> Result<Option<Client>, OAuthError> {
        self.inner.get_client(id, secret).await
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<Token>, OAuthError> {
        self.inner.get_refresh_token(token).await
    }

    async fn revoke_refresh_token(&self, token: &Token) -> Result<bool, OAuthError> {
        self.calls.lock().unwrap().push("revoke_refresh_token");
        self.inner.revoke_refresh_token(token).await
    }

    async fn save_token(&self, token: Token) -> Result<Token, OAuthError> {
        self.calls.lock().unwrap().push("save_token");
        self.inner.save_token(token).await
    }

    async fn get_access_token(&self, token: &str) -> Result<Option<Token>, OAuthError> {
        self.inner.get_access_token(token).await
    }
}

#[tokio::test]
async fn refresh_rotation_revokes_old_token_before_saving_new() {
    let inner = InMemoryModel::new();
    inner.add_client(demo_client(&["refresh_token"]));
    let seed = Token {
        access_token: "oldaccess".to_string(),
        access_token_expires_at: Some(chrono::Utc::now() + chrono::Duration::seconds(60)),
        refresh_token: Some("R1".to_string()),
        refresh_token_expires_at: Some(chrono::Utc::now() + chrono::Duration::seconds(3600)),
        scope: Some("read".to_string()),
        client: demo_client(&["refresh_token"]),
        user: alice(),
        extra: serde_json::Map::new(),
    };
    inner.save_token(seed).await.unwrap();

    let spy = Arc::new(RotationSpy {
        inner,
        calls: Mutex::new(Vec::new()),
    });
    let server = OAuthServer::new(spy.clone());

    let request = token_request(&[
        ("grant_type", "refresh_token"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
        ("refresh_token", "R1"),
        // the form scope is ignored on refresh
        ("scope", "write"),
    ]);
    let mut response = Response::new();
    server.token(&request, &mut response, None).await.unwrap();

    let body = response.body();
    let new_refresh = body["refresh_token"].as_str().unwrap();
    assert_ne!(new_refresh, "R1");
    assert_eq!(body["scope"], "read");

    // The fixture was seeded before the spy wrapped the model, so the
    // only calls on record belong to the exchange itself.
    let calls = spy.calls.lock().unwrap().clone();
    let revoke_at = calls.iter().position(|c| *c == "revoke_refresh_token");
    let save_at = calls.iter().position(|c| *c == "save_token");
    assert!(revoke_at.unwrap() < save_at.unwrap());

    // The consumed token is gone.
    assert!(spy.get_refresh_token("R1").await.unwrap().is_none());
}

#[tokio::test]
async fn refresh_without_rotation_keeps_old_token() {
    let (model, server) = setup(&["refresh_token"]);
    model
        .save_token(Token {
            access_token: "oldaccess".to_string(),
            access_token_expires_at: Some(chrono::Utc::now() + chrono::Duration::seconds(60)),
            refresh_token: Some("R1".to_string()),
            refresh_token_expires_at: Some(chrono::Utc::now() + chrono::Duration::seconds(3600)),
            scope: None,
            client: demo_client(&["refresh_token"]),
            user: alice(),
            extra: serde_json::Map::new(),
        })
        .await
        .unwrap();

    let request = token_request(&[
        ("grant_type", "refresh_token"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
        ("refresh_token", "R1"),
    ]);
    let overrides = TokenOverrides {
        always_issue_new_refresh_token: Some(false),
        ..TokenOverrides::default()
    };
    let mut response = Response::new();
    server
        .token(&request, &mut response, Some(overrides))
        .await
        .unwrap();

    assert!(response.body().get("refresh_token").is_none());
    assert!(model.get_refresh_token("R1").await.unwrap().is_some());
}

#[tokio::test]
async fn per_client_lifetime_overrides_endpoint_default() {
    let model = Arc::new(InMemoryModel::new());
    let mut client = demo_client(&["password"]);
    client.access_token_lifetime = Some(60);
    model.add_client(client);
    model.add_user(alice(), "pw");
    let server = OAuthServer::new(model.clone());

    let request = token_request(&[
        ("grant_type", "password"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
        ("username", "alice"),
        ("password", "pw"),
    ]);
    let mut response = Response::new();
    server.token(&request, &mut response, None).await.unwrap();
    let expires_in = response.body()["expires_in"].as_u64().unwrap();
    assert!((58..=60).contains(&expires_in));
}

#[tokio::test]
async fn unknown_grant_type_is_unsupported() {
    let (_, server) = setup(&["password"]);
    let request = token_request(&[
        ("grant_type", "device_code"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
    ]);
    let mut response = Response::new();
    let error = server.token(&request, &mut response, None).await.unwrap_err();
    assert!(matches!(error, OAuthError::UnsupportedGrantType(_)));
    assert_eq!(response.body()["error"], "unsupported_grant_type");
}

#[tokio::test]
async fn grant_must_be_allowed_for_the_client() {
    let (_, server) = setup(&["authorization_code"]);
    let request = token_request(&[
        ("grant_type", "password"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
        ("username", "alice"),
        ("password", "pw"),
    ]);
    let mut response = Response::new();
    let error = server.token(&request, &mut response, None).await.unwrap_err();
    assert!(matches!(error, OAuthError::UnauthorizedClient(_)));
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn bad_basic_credentials_answer_401_with_challenge() {
    let (_, server) = setup(&["password"]);
    // base64("c1:wrong")
    let request = Request::builder("POST")
        .form_encoded()
        .header("Authorization", "Basic YzE6d3Jvbmc=")
        .body_param("grant_type", "password")
        .body_param("username", "alice")
        .body_param("password", "pw")
        .build();
    let mut response = Response::new();
    let error = server.token(&request, &mut response, None).await.unwrap_err();
    assert!(matches!(error, OAuthError::InvalidClient(_)));
    assert_eq!(response.status(), 401);
    assert_eq!(
        response.header("www-authenticate"),
        Some("Basic realm=\"Service\"")
    );
    assert_eq!(response.body()["error"], "invalid_client");
}

#[tokio::test]
async fn non_form_posts_are_rejected() {
    let (_, server) = setup(&["password"]);
    let get = Request::builder("GET").form_encoded().build();
    let mut response = Response::new();
    assert!(matches!(
        server.token(&get, &mut response, None).await.unwrap_err(),
        OAuthError::InvalidRequest(_)
    ));

    let json_post = Request::builder("POST")
        .header("Content-Type", "application/json")
        .build();
    let mut response = Response::new();
    assert!(matches!(
        server.token(&json_post, &mut response, None).await.unwrap_err(),
        OAuthError::InvalidRequest(_)
    ));
}

#[tokio::test]
async fn missing_client_secret_is_invalid_request() {
    let (_, server) = setup(&["password"]);
    let request = token_request(&[
        ("grant_type", "password"),
        ("client_id", "c1"),
        ("username", "alice"),
        ("password", "pw"),
    ]);
    let mut response = Response::new();
    let error = server.token(&request, &mut response, None).await.unwrap_err();
    assert!(matches!(error, OAuthError::InvalidRequest(_)));
    assert_eq!(response.body()["error"], "invalid_request");
}

#[tokio::test]
async fn client_authentication_can_be_relaxed_per_grant() {
    let model = Arc::new(InMemoryModel::new());
    let mut client = demo_client(&["password"]);
    client.secret = None;
    model.add_client(client);
    model.add_user(alice(), "pw");

    let mut table = HashMap::new();
    table.insert("password".to_string(), false);
    let overrides = TokenOverrides {
        require_client_authentication: Some(table),
        ..TokenOverrides::default()
    };

    let server = OAuthServer::new(model);
    let request = token_request(&[
        ("grant_type", "password"),
        ("client_id", "c1"),
        ("username", "alice"),
        ("password", "pw"),
    ]);
    let mut response = Response::new();
    server
        .token(&request, &mut response, Some(overrides))
        .await
        .unwrap();
    assert_eq!(response.body()["token_type"], "Bearer");
}

/// Minimal extension grant: issues a fixed-scope token to whoever asks.
struct EchoGrant {
    model: Arc<InMemoryModel>,
}

#[async_trait]
impl oauth_service::GrantType for EchoGrant {
    async fn execute(&self, _request: &Request, client: &Client) -> Result<Token, OAuthError> {
        self.model
            .save_token(Token {
                access_token: "extension-token".to_string(),
                access_token_expires_at: Some(
                    chrono::Utc::now() + chrono::Duration::seconds(120),
                ),
                refresh_token: None,
                refresh_token_expires_at: None,
                scope: Some("echo".to_string()),
                client: client.clone(),
                user: User {
                    id: "system".to_string(),
                    username: "system".to_string(),
                },
                extra: serde_json::Map::new(),
            })
            .await
    }
}

#[tokio::test]
async fn extension_grants_dispatch_by_identifier() {
    let model = Arc::new(InMemoryModel::new());
    model.add_client(demo_client(&["urn:example:echo"]));
    let server = OAuthServer::new(model.clone())
        .extension_grant("urn:example:echo", Arc::new(EchoGrant { model }));

    let request = token_request(&[
        ("grant_type", "urn:example:echo"),
        ("client_id", "c1"),
        ("client_secret", "s1"),
    ]);
    let mut response = Response::new();
    server.token(&request, &mut response, None).await.unwrap();
    assert_eq!(response.body()["access_token"], "extension-token");
    assert_eq!(response.body()["scope"], "echo");
}
