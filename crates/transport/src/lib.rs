//! Transport client for the case service.
//!
//! Everything that touches the network goes through [`Transport`], so the
//! repository can be driven by the reqwest-backed [`HttpTransport`] in
//! production and by a scripted transport in tests.

pub mod error;
pub mod http;
#[cfg(feature = "testing")]
pub mod testing;

use async_trait::async_trait;
use std::path::PathBuf;

pub use error::TransportError;
pub use http::{HttpTransport, TransportConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A file streamed from disk as the `file` part of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartUpload {
    pub file_path: PathBuf,
    /// Name reported to the server for the file part
    pub file_name: String,
    pub mime_type: String,
    /// Text fields sent alongside the file, in order
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    Multipart(MultipartUpload),
}

/// A request relative to the transport's base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn multipart(path: impl Into<String>, upload: MultipartUpload) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Multipart(upload),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Value of the first query parameter named `key`
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// Status code and raw body; interpreting either is the caller's job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues a single HTTP round trip.
/// Any HTTP status is a successful send; only failures to complete the
/// exchange are `TransportError`s.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
