use oauth_service::OAuthError;

#[test]
fn taxonomy_maps_to_wire_code_status_and_description() {
    let cases = vec![
        (
            OAuthError::invalid_request("Missing parameter: `grant_type`"),
            "invalid_request",
            400,
        ),
        (
            OAuthError::invalid_client("Invalid client: client is invalid"),
            "invalid_client",
            400,
        ),
        (
            OAuthError::invalid_grant("Invalid grant: authorization code is invalid"),
            "invalid_grant",
            400,
        ),
        (
            OAuthError::invalid_scope("Invalid parameter: `scope`"),
            "invalid_scope",
            400,
        ),
        (
            OAuthError::invalid_token("Invalid token: access token has expired"),
            "invalid_token",
            401,
        ),
        (
            OAuthError::unauthorized_client("Unauthorized client: `grant_type` is invalid"),
            "unauthorized_client",
            400,
        ),
        (
            OAuthError::unauthorized_request("Unauthorized request: no authentication given"),
            "unauthorized_request",
            401,
        ),
        (
            OAuthError::unsupported_grant_type("Unsupported grant type: `grant_type` is invalid"),
            "unsupported_grant_type",
            400,
        ),
        (
            OAuthError::unsupported_response_type(
                "Unsupported response type: `response_type` is not supported",
            ),
            "unsupported_response_type",
            400,
        ),
        (
            OAuthError::unsupported_token_type("Unsupported token type: `token_hint` is invalid"),
            "unsupported_token_type",
            400,
        ),
        (
            OAuthError::access_denied("Access denied: user denied access to application"),
            "access_denied",
            400,
        ),
        (
            OAuthError::insufficient_scope(
                "Insufficient scope: authorized scope is insufficient",
            ),
            "insufficient_scope",
            403,
        ),
        (
            OAuthError::server_error("Internal server error"),
            "server_error",
            500,
        ),
        (
            OAuthError::invalid_argument("model does not implement `get_user`"),
            "invalid_argument",
            500,
        ),
    ];

    for (error, expected_code, expected_status) in cases {
        assert_eq!(error.name(), expected_code, "code for {error:?}");
        assert_eq!(error.status(), expected_status, "status for {error:?}");

        let body = error.to_body();
        assert_eq!(body["error"], expected_code, "body code for {error:?}");
        assert_eq!(
            body["error_description"],
            error.description(),
            "body description for {error:?}"
        );
    }
}

#[test]
fn display_carries_code_and_description() {
    let error = OAuthError::invalid_grant("refresh token has expired");
    assert_eq!(error.to_string(), "invalid_grant: refresh token has expired");
}
