//! Outgoing response helpers

use crate::traits::HostResponse;

/// Media type of every document this crate produces.
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// In-memory response, for hosts that assemble the HTTP response later and
/// for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedResponse {
    pub status: u16,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header lookup is case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => *slot = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn set_body(&mut self, body: String) {
        self.body = Some(body);
    }
}

impl HostResponse for BufferedResponse {
    fn set_content_type(&mut self, media_type: &str) {
        self.set_header("content-type", media_type);
    }
}
