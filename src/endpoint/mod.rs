//! The five protocol endpoints, plus the request plumbing they share:
//! client-credential extraction, POST/form enforcement and error-body
//! shaping.

pub mod authenticate;
pub mod authorize;
pub mod introspect;
pub mod revoke;
pub mod token;

pub use authenticate::AuthenticateEndpoint;
pub use authorize::AuthorizeEndpoint;
pub use introspect::IntrospectEndpoint;
pub use revoke::RevokeEndpoint;
pub use token::TokenEndpoint;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use crate::error::OAuthError;
use crate::request::Request;
use crate::response::Response;
use crate::validators;

/// Client credentials pulled from a request, plus where they came from.
/// The 401 + `WWW-Authenticate` rule keys on the `Authorization` header
/// having been used.
pub(crate) struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub from_authorization_header: bool,
}

/// Extract client credentials: HTTP Basic wins over form fields.
///
/// `secret_required` reflects the endpoint's policy for this call (the
/// per-grant `require_client_authentication` table, or
/// `is_client_secret_required` on introspect/revoke).
pub(crate) fn read_client_credentials(
    request: &Request,
    secret_required: bool,
) -> Result<ClientCredentials, OAuthError> {
    let from_authorization_header = request.header("authorization").is_some();
    let (client_id, client_secret) = match request.header("authorization").and_then(decode_basic)
    {
        Some((id, secret)) => (Some(id), secret),
        None => (
            request.body_param("client_id").map(str::to_string),
            request.body_param("client_secret").map(str::to_string),
        ),
    };

    let client_id =
        client_id.ok_or_else(|| OAuthError::invalid_request("Missing parameter: `client_id`"))?;
    if !validators::is_vschar(&client_id) {
        return Err(OAuthError::invalid_request("Invalid parameter: `client_id`"));
    }
    if secret_required && client_secret.is_none() {
        return Err(OAuthError::invalid_request(
            "Missing parameter: `client_secret`",
        ));
    }
    if let Some(secret) = &client_secret {
        if !validators::is_vschar(secret) {
            return Err(OAuthError::invalid_request(
                "Invalid parameter: `client_secret`",
            ));
        }
    }
    Ok(ClientCredentials {
        client_id,
        client_secret,
        from_authorization_header,
    })
}

/// Parse an `Authorization: Basic` header value. Anything malformed
/// falls back to form credentials rather than failing the request.
fn decode_basic(value: &str) -> Option<(String, Option<String>)> {
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (id, secret) = decoded.split_once(':')?;
    if id.is_empty() {
        return None;
    }
    Some((id.to_string(), Some(secret.to_string())))
}

/// Reject anything that is not a form-encoded POST.
pub(crate) fn require_form_post(request: &Request) -> Result<(), OAuthError> {
    if request.method() != "POST" {
        return Err(OAuthError::invalid_request(
            "Invalid request: method must be POST",
        ));
    }
    if !request.is_form_encoded() {
        return Err(OAuthError::invalid_request(
            "Invalid request: content must be application/x-www-form-urlencoded",
        ));
    }
    Ok(())
}

/// Which token table an introspection or revocation request points at.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum TokenHint {
    AccessToken,
    RefreshToken,
}

/// The `token` + `token_hint` pair shared by the introspect and revoke
/// request shapes.
pub(crate) fn read_token_and_hint(request: &Request) -> Result<(String, TokenHint), OAuthError> {
    let token = request
        .body_param("token")
        .ok_or_else(|| OAuthError::invalid_request("Missing parameter: `token`"))?;
    let hint = match request.body_param("token_hint") {
        None => {
            return Err(OAuthError::invalid_request(
                "Missing parameter: `token_hint`",
            ));
        }
        Some("access_token") => TokenHint::AccessToken,
        Some("refresh_token") => TokenHint::RefreshToken,
        Some(_) => {
            return Err(OAuthError::unsupported_token_type(
                "Unsupported token type: `token_hint` is invalid",
            ));
        }
    };
    Ok((token.to_string(), hint))
}

/// Default error shaping: log, then status + `{error, error_description}`
/// body.
pub(crate) fn write_error(response: &mut Response, error: &OAuthError) {
    warn!(
        code = error.name(),
        status = error.status(),
        description = error.description(),
        "oauth request failed"
    );
    response.set_status(error.status());
    response.set_body(error.to_body());
}

/// The `invalid_client` escalation shared by the token, introspect and
/// revoke endpoints: when the failed credentials arrived in the
/// `Authorization` header, answer 401 and challenge with Basic.
pub(crate) fn write_client_error(request: &Request, response: &mut Response, error: &OAuthError) {
    write_error(response, error);
    if matches!(error, OAuthError::InvalidClient(_))
        && request.header("authorization").is_some()
    {
        response.set_status(401);
        response.set_header("www-authenticate", "Basic realm=\"Service\"");
    }
}
