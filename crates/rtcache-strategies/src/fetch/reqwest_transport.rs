//! Transport backed by a `reqwest` client.

use async_trait::async_trait;
use rtcache_domain::{Request, Response};

use super::transport::{FetchOptions, Transport, TransportError, TransportErrorKind};

/// HTTP transport over a pooled `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &Request, options: &FetchOptions) -> Result<Response, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let upstream = builder.send().await.map_err(classify)?;

        let status = upstream.status();
        let headers = upstream.headers().clone();
        let url = upstream.url().clone();
        let body = upstream.bytes().await.map_err(classify)?;

        let mut response = Response::new(status, body).with_url(url);
        response.headers = headers;
        Ok(response)
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connectivity
    } else if err.is_request() || err.is_body() || err.is_decode() || err.is_redirect() {
        TransportErrorKind::Protocol
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, err.to_string())
}
