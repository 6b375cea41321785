//! Conversions between axum's HTTP types and the engine's request/response.

use axum::body::Body;
use axum::http::header::{CONNECTION, HOST, TRANSFER_ENCODING};
use axum::http::{HeaderMap, Uri};
use rtcache_domain::{Request, Response};
use url::Url;

use crate::error::{ProxyError, ProxyResult};

/// Largest inbound request body forwarded upstream.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Place the inbound path and query under the upstream's base path.
///
/// Only the path and query of `uri` are used, so neither an absolute-form
/// target nor a `//host/...` path can move the request to another origin.
pub fn upstream_url(upstream: &Url, uri: &Uri) -> ProxyResult<Url> {
    let base = upstream.path().trim_end_matches('/');
    let mut url = upstream.clone();
    url.set_path(&format!("{base}{}", uri.path()));
    url.set_query(uri.query());

    if url.origin() != upstream.origin() || !url.path().starts_with(&format!("{base}/")) {
        return Err(ProxyError::InvalidRequest(format!(
            "cannot route '{uri}' outside {upstream}"
        )));
    }
    Ok(url)
}

/// Turn an inbound request into the engine's request for `upstream`.
pub async fn into_domain_request(upstream: &Url, request: axum::extract::Request) -> ProxyResult<Request> {
    let (parts, body) = request.into_parts();
    let url = upstream_url(upstream, &parts.uri)?;
    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ProxyError::InvalidRequest(e.to_string()))?;

    let mut domain = Request::new(parts.method, url);
    domain.headers = forwardable(parts.headers);
    if !body.is_empty() {
        domain = domain.with_body(body);
    }
    Ok(domain)
}

/// Turn the engine's response into one axum can send.
pub fn into_http_response(mut response: Response) -> ProxyResult<axum::response::Response> {
    let body = response.bytes()?;
    let mut http = axum::response::Response::new(Body::from(body));
    *http.status_mut() = response.status;
    *http.headers_mut() = forwardable(response.headers);
    Ok(http)
}

/// Drop hop-by-hop headers.
fn forwardable(mut headers: HeaderMap) -> HeaderMap {
    for name in [HOST, CONNECTION, TRANSFER_ENCODING] {
        headers.remove(name);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};

    #[test]
    fn test_upstream_url_keeps_path_and_query() {
        let upstream = Url::parse("https://origin.example.com").unwrap();
        let uri: Uri = "/img/logo.png?v=3".parse().unwrap();

        let url = upstream_url(&upstream, &uri).unwrap();

        assert_eq!(url.as_str(), "https://origin.example.com/img/logo.png?v=3");
    }

    #[test]
    fn test_upstream_url_keeps_base_path() {
        let upstream = Url::parse("http://origin.test/api/").unwrap();
        let uri: Uri = "/img/a.png".parse().unwrap();

        let url = upstream_url(&upstream, &uri).unwrap();

        assert_eq!(url.as_str(), "http://origin.test/api/img/a.png");
    }

    #[test]
    fn test_upstream_url_ignores_foreign_host() {
        let upstream = Url::parse("http://origin.test").unwrap();

        for target in ["//evil.example/steal?x=1", "http://evil.example/steal?x=1"] {
            let uri: Uri = target.parse().unwrap();
            let url = upstream_url(&upstream, &uri).unwrap();

            assert_eq!(url.host_str(), Some("origin.test"), "routed {target} to {url}");
            assert!(url.path().ends_with("/steal"));
            assert_eq!(url.query(), Some("x=1"));
        }
    }

    #[test]
    fn test_upstream_url_rejects_escaping_base_path() {
        let upstream = Url::parse("http://origin.test/api/").unwrap();
        let uri: Uri = "/../admin".parse().unwrap();

        assert!(matches!(
            upstream_url(&upstream, &uri),
            Err(ProxyError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_into_domain_request() {
        let upstream = Url::parse("http://127.0.0.1:3000").unwrap();
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/users")
            .header("host", "proxy.local")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let domain = into_domain_request(&upstream, request).await.unwrap();

        assert_eq!(domain.method, Method::POST);
        assert_eq!(domain.url.as_str(), "http://127.0.0.1:3000/api/users");
        assert!(domain.headers.get("host").is_none());
        assert_eq!(domain.headers.get("content-type").unwrap(), "application/json");
        assert_eq!(domain.body.as_deref(), Some(&b"{}"[..]));
    }

    #[tokio::test]
    async fn test_into_http_response() {
        let response = Response::new(StatusCode::CREATED, "made");

        let http = into_http_response(response).unwrap();

        assert_eq!(http.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(http.into_body(), 1024).await.unwrap();
        assert_eq!(body.as_ref(), b"made");
    }

    #[test]
    fn test_consumed_body_is_an_error() {
        let mut response = Response::ok("once");
        response.bytes().unwrap();

        assert!(matches!(into_http_response(response), Err(ProxyError::BodyUsed(_))));
    }
}
