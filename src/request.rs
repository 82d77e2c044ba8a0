//! Normalized, immutable request value consumed by the endpoints.

use std::collections::HashMap;

/// A parsed HTTP request.
///
/// The transport adapter builds one per call: the method is uppercased and
/// header names lowercased at construction, query and form body arrive as
/// flat string maps. The engine never mutates a request.
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
    body: HashMap<String, String>,
}

impl Request {
    pub fn new(
        method: impl Into<String>,
        headers: HashMap<String, String>,
        query: HashMap<String, String>,
        body: HashMap<String, String>,
    ) -> Self {
        Request {
            method: method.into().to_uppercase(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
            query,
            body,
        }
    }

    /// Start building a request. Mostly useful for hosts gluing a
    /// transport on, and for tests.
    pub fn builder(method: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            method: method.into(),
            headers: HashMap::new(),
            query: HashMap::new(),
            body: HashMap::new(),
        }
    }

    /// Uppercased HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn body_param(&self, name: &str) -> Option<&str> {
        self.body.get(name).map(String::as_str)
    }

    /// Body ∪ query lookup, body taking precedence.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.body_param(name).or_else(|| self.query_param(name))
    }

    /// Whether the request body was form-encoded.
    pub fn is_form_encoded(&self) -> bool {
        self.header("content-type")
            .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
    }
}

/// Builder returned by [`Request::builder`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: String,
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
    body: HashMap<String, String>,
}

impl RequestBuilder {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn body_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(name.into(), value.into());
        self
    }

    /// Shorthand for the form content type every POST endpoint expects.
    pub fn form_encoded(self) -> Self {
        self.header("Content-Type", "application/x-www-form-urlencoded")
    }

    pub fn build(self) -> Request {
        Request::new(self.method, self.headers, self.query, self.body)
    }
}
