use crate::{HttpRequest, HttpResponse, Method, MultipartUpload, RequestBody, Transport, TransportError};
use async_trait::async_trait;
use reqwest::{multipart, Body, Client};
use std::time::Duration;
use tracing::debug;

/// Connection settings for [`HttpTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Scheme, host and optional prefix, e.g. `http://127.0.0.1:5000/api/cases`
    pub base_url: String,
    /// Overall request timeout; `None` keeps reqwest's defaults
    pub timeout: Option<Duration>,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build multipart form; the dump is streamed from disk rather than buffered
    async fn build_multipart_form(upload: MultipartUpload) -> Result<multipart::Form, TransportError> {
        let file = tokio::fs::File::open(&upload.file_path)
            .await
            .map_err(|e| TransportError::io(&upload.file_path, e))?;
        let length = file
            .metadata()
            .await
            .map_err(|e| TransportError::io(&upload.file_path, e))?
            .len();

        let part = multipart::Part::stream_with_length(Body::from(file), length)
            .file_name(upload.file_name)
            .mime_str(&upload.mime_type)?;

        let form = upload
            .fields
            .into_iter()
            .fold(multipart::Form::new(), |form, (name, value)| form.text(name, value))
            .part("file", part);

        Ok(form)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.url(&request.path);
        debug!(method = ?request.method, url = %url, query = ?request.query, "sending request");

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        let builder = if request.query.is_empty() {
            builder
        } else {
            builder.query(&request.query)
        };
        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Multipart(upload) => builder.multipart(Self::build_multipart_form(upload).await?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "response received");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = TransportConfig::new("http://127.0.0.1:5000/api/cases/");
        assert_eq!(config.base_url, "http://127.0.0.1:5000/api/cases");
        assert_eq!(config.timeout, None);

        let config = config.with_timeout(Duration::from_secs(3));
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_url_joins_path() {
        let transport = HttpTransport::new(TransportConfig::new("http://localhost:5000/api/cases")).unwrap();
        assert_eq!(transport.url("/7/status"), "http://localhost:5000/api/cases/7/status");
    }

    #[tokio::test]
    async fn test_multipart_missing_file_is_io_error() {
        let upload = MultipartUpload {
            file_path: "/definitely/not/here.raw".into(),
            file_name: "here.raw".into(),
            mime_type: "application/octet-stream".into(),
            fields: vec![("name".into(), "Case A".into())],
        };
        let result = HttpTransport::build_multipart_form(upload).await;
        assert!(matches!(result, Err(TransportError::Io { .. })));
    }

    #[tokio::test]
    async fn test_multipart_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"MEMDUMP").unwrap();
        let upload = MultipartUpload {
            file_path: file.path().to_path_buf(),
            file_name: "dump.raw".into(),
            mime_type: "application/octet-stream".into(),
            fields: vec![("name".into(), "Case A".into())],
        };
        assert!(HttpTransport::build_multipart_form(upload).await.is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_transport_error() {
        // Port 9 (discard) is closed on test machines
        let transport = HttpTransport::new(
            TransportConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(5)),
        )
        .unwrap();
        let result = transport.send(HttpRequest::get("/")).await;
        assert!(matches!(
            result,
            Err(TransportError::Connect(_)) | Err(TransportError::Request(_)) | Err(TransportError::Timeout(_))
        ));
    }
}
