//! # Runtime Caching - Domain Model
//!
//! HTTP value types shared by the strategy engine, its cache stores and
//! transports, and the host process. A [`Response`] body can be read exactly
//! once; anything that needs the bytes twice must call
//! [`Response::try_clone`] before the first read.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Parameters extracted by the routing layer when it matched a request.
pub type RouteParams = HashMap<String, String>;

// =============================================================================
// REQUEST
// =============================================================================

/// Outgoing request as seen by strategies and plugins.
///
/// Request bodies are reference-counted [`Bytes`], so cloning a request is
/// cheap and never consumes anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Parse `url` and build a request for it.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if `url` is not absolute.
    pub fn parse(method: Method, url: &str) -> Result<Self, DomainError> {
        Ok(Self::new(method, Url::parse(url)?))
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Key a cache store files this request under.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// URL with its query string and fragment removed.
    #[must_use]
    pub fn url_without_search(&self) -> Url {
        let mut url = self.url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

// =============================================================================
// BODY
// =============================================================================

/// Single-read response body.
///
/// Deliberately not `Clone`: duplication goes through [`Body::try_clone`],
/// which refuses once the body has been taken.
#[derive(Debug)]
pub struct Body(Option<Bytes>);

impl Body {
    pub fn empty() -> Self {
        Self(Some(Bytes::new()))
    }

    #[must_use]
    pub const fn is_used(&self) -> bool {
        self.0.is_none()
    }

    /// Read the body, leaving it marked as used.
    ///
    /// # Errors
    ///
    /// Returns [`BodyUsed`] on the second read.
    pub fn take(&mut self) -> Result<Bytes, BodyUsed> {
        self.0.take().ok_or(BodyUsed)
    }

    /// Duplicate an unread body.
    ///
    /// # Errors
    ///
    /// Returns [`BodyUsed`] if the body was already read.
    pub fn try_clone(&self) -> Result<Self, BodyUsed> {
        self.0.clone().map(|bytes| Self(Some(bytes))).ok_or(BodyUsed)
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self(Some(bytes))
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Some(Bytes::from(bytes)))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self(Some(Bytes::from(text)))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self(Some(Bytes::from_static(text.as_bytes())))
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Self(Some(Bytes::from_static(bytes)))
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// How the response was obtained, mirroring the fetch response types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    #[default]
    Basic,
    Cors,
    /// Cross-origin response whose status and body are hidden from us.
    Opaque,
}

/// Response produced by the network or read back from a cache store.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub response_type: ResponseType,
    pub url: Option<Url>,
    body: Body,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            response_type: ResponseType::Basic,
            url: None,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Opaque responses carry no readable body.
    pub fn opaque() -> Self {
        let mut response = Self::new(StatusCode::OK, Body::empty());
        response.response_type = ResponseType::Opaque;
        response
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// True for a 2xx status.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.response_type == ResponseType::Opaque
    }

    #[must_use]
    pub const fn body_used(&self) -> bool {
        self.body.is_used()
    }

    /// Read the body.
    ///
    /// # Errors
    ///
    /// Returns [`BodyUsed`] if the body was already read.
    pub fn bytes(&mut self) -> Result<Bytes, BodyUsed> {
        self.body.take()
    }

    /// Duplicate the response so two readers can each consume a body.
    ///
    /// # Errors
    ///
    /// Returns [`BodyUsed`] if the body was already read.
    pub fn try_clone(&self) -> Result<Self, BodyUsed> {
        Ok(Self {
            status: self.status,
            headers: self.headers.clone(),
            response_type: self.response_type,
            url: self.url.clone(),
            body: self.body.try_clone()?,
        })
    }

    /// Consume the response into a serializable snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`BodyUsed`] if the body was already read.
    pub fn into_stored(mut self) -> Result<StoredResponse, BodyUsed> {
        let body = self.body.take()?;
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    Bytes::copy_from_slice(value.as_bytes()),
                )
            })
            .collect();

        Ok(StoredResponse {
            status: self.status.as_u16(),
            headers,
            response_type: self.response_type,
            url: self.url,
            body,
            stored_at: Utc::now(),
        })
    }
}

// =============================================================================
// STORED RESPONSE
// =============================================================================

/// Response snapshot as persisted by a cache store.
///
/// Every call to [`StoredResponse::to_response`] yields a fresh, unread
/// [`Response`], so one stored entry can serve any number of readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status: u16,
    /// Header values as raw bytes; not every valid value is UTF-8.
    pub headers: Vec<(String, Bytes)>,
    pub response_type: ResponseType,
    pub url: Option<Url>,
    pub body: Bytes,
    pub stored_at: DateTime<Utc>,
}

impl StoredResponse {
    /// Rebuild a readable response.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidStoredResponse`] if the status or a
    /// header no longer parses.
    pub fn to_response(&self) -> Result<Response, DomainError> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|e| DomainError::InvalidStoredResponse(e.to_string()))?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DomainError::InvalidStoredResponse(e.to_string()))?;
            let value = HeaderValue::from_bytes(value)
                .map_err(|e| DomainError::InvalidStoredResponse(e.to_string()))?;
            headers.append(name, value);
        }

        Ok(Response {
            status,
            headers,
            response_type: self.response_type,
            url: self.url.clone(),
            body: Body::from(self.body.clone()),
        })
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// A body was read a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("response body has already been consumed")]
pub struct BodyUsed;

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid stored response: {0}")]
    InvalidStoredResponse(String),
}
