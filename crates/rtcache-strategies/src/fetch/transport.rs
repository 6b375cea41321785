//! Network transport capability.

use async_trait::async_trait;
use rtcache_domain::{Request, Response};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Options handed to the transport unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Per-request timeout enforced by the transport, if any.
    pub timeout: Option<Duration>,
}

/// Broad class of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Could not reach the remote host.
    Connectivity,
    Timeout,
    /// The exchange started but was malformed or cut short.
    Protocol,
    Other,
}

impl TransportErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connectivity => "connectivity",
            Self::Timeout => "timeout",
            Self::Protocol => "protocol",
            Self::Other => "transport",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connectivity, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }
}

/// Performs one outbound request. No retries, no caching.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request, options: &FetchOptions) -> Result<Response, TransportError>;
}

/// Shared transport handle
pub type SharedTransport = Arc<dyn Transport>;
