//! Mutable response builder filled by the endpoints.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// An HTTP response under construction.
///
/// Lives for one call. Header names are stored lowercased so lookups are
/// case-insensitive; the body is a JSON object, empty until an endpoint
/// sets it.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: Map<String, Value>,
}

impl Response {
    pub fn new() -> Self {
        Response {
            status: 200,
            headers: HashMap::new(),
            body: Map::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into().to_lowercase(), value.into());
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn set_body(&mut self, body: Map<String, Value>) {
        self.body = body;
    }

    /// Point the client at `url`: sets `Location` and status 302.
    pub fn redirect(&mut self, url: &str) {
        self.set_header("location", url);
        self.status = 302;
    }
}

impl Default for Response {
    fn default() -> Self {
        Response::new()
    }
}
