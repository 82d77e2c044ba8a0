//! Framework-agnostic OAuth 2.0 authorization server core.
//!
//! The crate implements the server side of RFC 6749 (authorization
//! framework), RFC 6750 (bearer tokens), RFC 7662 (introspection) and
//! RFC 7009 (revocation) as five endpoint pipelines over a host-supplied
//! [`Model`] backend. It never touches a socket: the host parses HTTP into
//! a [`Request`], hands the engine a mutable [`Response`], and maps the
//! result back onto its transport of choice.

pub mod crypto;
pub mod endpoint;
pub mod error;
pub mod grants;
pub mod memory;
pub mod model;
pub mod request;
pub mod response;
pub mod server;
pub mod types;
pub mod validators;

pub use endpoint::authenticate::{AuthenticateEndpoint, AuthenticateOptions};
pub use endpoint::authorize::{AuthenticateHandler, AuthorizeEndpoint, AuthorizeOptions};
pub use endpoint::introspect::{IntrospectEndpoint, IntrospectOptions};
pub use endpoint::revoke::{RevokeEndpoint, RevokeOptions};
pub use endpoint::token::{TokenEndpoint, TokenOptions};
pub use error::OAuthError;
pub use grants::GrantType;
pub use memory::InMemoryModel;
pub use model::Model;
pub use request::Request;
pub use response::Response;
pub use server::{
    AuthenticateOverrides, AuthorizeOverrides, IntrospectOverrides, OAuthServer, RevokeOverrides,
    TokenOverrides,
};
pub use types::{AuthorizationCode, BearerToken, Client, IntrospectionResponse, Token, User};
