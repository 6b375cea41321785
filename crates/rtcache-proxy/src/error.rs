//! # Proxy Error Types
//!
//! Maps strategy failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rtcache_domain::BodyUsed;
use rtcache_strategies::{StrategyError, TransportErrorKind};
use thiserror::Error;

/// Proxy-level errors
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    BodyUsed(#[from] BodyUsed),
}

impl ProxyError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Strategy(StrategyError::Network(e)) if e.kind == TransportErrorKind::Timeout => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::Strategy(StrategyError::Network(_)) => StatusCode::BAD_GATEWAY,
            Self::Strategy(StrategyError::NoCachedResponse { .. }) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Strategy(_) | Self::BodyUsed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for the JSON body
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Strategy(StrategyError::Network(e)) if e.kind == TransportErrorKind::Timeout => {
                "UPSTREAM_TIMEOUT"
            }
            Self::Strategy(StrategyError::Network(_)) => "UPSTREAM_UNAVAILABLE",
            Self::Strategy(StrategyError::NoCachedResponse { .. }) => "NOT_CACHED",
            Self::Strategy(StrategyError::PluginHook { .. }) => "PLUGIN_ERROR",
            Self::Strategy(StrategyError::CacheRead(_) | StrategyError::CacheWrite(_)) => "CACHE_ERROR",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Strategy(_) | Self::BodyUsed(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "Request failed");
        }

        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "code": self.error_code(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Result type alias for proxy handlers
pub type ProxyResult<T> = Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rtcache_strategies::TransportError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ProxyError::from(StrategyError::Network(TransportError::connectivity("refused"))),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ProxyError::from(StrategyError::Network(TransportError::timeout("slow"))),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ProxyError::from(StrategyError::NoCachedResponse {
                    url: "https://example.com/".parse().unwrap(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (ProxyError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (ProxyError::BodyUsed(BodyUsed), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error}");
        }
    }

    #[test]
    fn test_into_response_status() {
        let response = ProxyError::from(StrategyError::Network(TransportError::timeout("slow"))).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
