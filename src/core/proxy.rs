use crate::core::chain::MiddlewareChain;
use crate::core::classifier::classify_request;
use crate::utils::error::{ProxyError, Result};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{
    CONNECTION, CONTENT_LENGTH, HOST, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, TE, TRAILER,
    TRANSFER_ENCODING, UPGRADE,
};
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use url::Url;

/// Headers that describe a single hop and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    CONNECTION,
    CONTENT_LENGTH,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

#[derive(Clone)]
pub struct ProxyState {
    backend: Url,
    client: reqwest::Client,
    chain: Arc<MiddlewareChain>,
    max_body_bytes: usize,
}

impl ProxyState {
    pub fn new(backend: &str, chain: MiddlewareChain, max_body_bytes: usize) -> Result<Self> {
        let backend = Url::parse(backend).map_err(|e| ProxyError::InvalidConfigValueError {
            field: "server.backend".to_string(),
            value: backend.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        // Redirects belong to the device, not to the proxy.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            backend,
            client,
            chain: Arc::new(chain),
            max_body_bytes,
        })
    }

    pub fn backend(&self) -> &Url {
        &self.backend
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .fallback(forward)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: ProxyState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::result::Result<(), std::io::Error> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn forward(State(state): State<ProxyState>, mut req: Request) -> Response {
    let tag = classify_request(req.uri().path());
    tracing::debug!(
        method = %req.method(),
        path = %req.uri().path(),
        message_type = %tag.message_type,
        "Proxying request"
    );

    if let Err(e) = state.chain.process_request(&mut req).await {
        tracing::error!(error = %e, "Request hooks failed, not forwarding");
        return (StatusCode::INTERNAL_SERVER_ERROR, "request could not be processed").into_response();
    }

    let mut resp = match forward_to_backend(&state, req).await {
        Ok(resp) => resp,
        Err(ProxyError::BackendError(e)) => {
            tracing::error!(backend = %state.backend, error = %e, "Backend request failed");
            return (StatusCode::BAD_GATEWAY, "backend unavailable").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not forward request");
            return (StatusCode::INTERNAL_SERVER_ERROR, "request could not be processed")
                .into_response();
        }
    };

    // The backend already answered; hook failures never change that answer.
    if let Err(e) = state.chain.process_response(&mut resp).await {
        tracing::warn!(error = %e, "Response hooks reported an error");
    }

    resp
}

async fn forward_to_backend(state: &ProxyState, req: Request) -> Result<Response> {
    let (parts, body) = req.into_parts();
    let is_head = parts.method == Method::HEAD;
    let body = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| ProxyError::LocalFault {
            message: format!("read request body: {}", e),
        })?;

    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(HOST);

    let upstream = state
        .client
        .request(parts.method, backend_url(&state.backend, &parts.uri))
        .headers(headers)
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let headers = backend_response_headers(upstream.headers(), is_head);
    let body = upstream.bytes().await?;

    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    *resp.headers_mut() = headers;
    Ok(resp)
}

fn backend_url(backend: &Url, uri: &Uri) -> String {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{}{}", backend.as_str().trim_end_matches('/'), path_and_query)
}

/// Removes the fixed hop-by-hop set plus any header the `Connection` header names.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// A HEAD reply has no body to recompute the length from, so the backend's
/// `Content-Length` is passed through as is.
fn backend_response_headers(upstream: &HeaderMap, is_head: bool) -> HeaderMap {
    let content_length = is_head
        .then(|| upstream.get(CONTENT_LENGTH).cloned())
        .flatten();

    let mut headers = upstream.clone();
    strip_hop_by_hop(&mut headers);
    if let Some(length) = content_length {
        headers.insert(CONTENT_LENGTH, length);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_url_keeps_path_and_query() {
        let backend = Url::parse("http://127.0.0.1:8081").unwrap();
        let uri: Uri = "/fdo/101/msg/10?trace=1".parse().unwrap();
        assert_eq!(
            backend_url(&backend, &uri),
            "http://127.0.0.1:8081/fdo/101/msg/10?trace=1"
        );

        let prefixed = Url::parse("http://fdo.internal/owner/").unwrap();
        let uri: Uri = "/fdo/101/msg/60".parse().unwrap();
        assert_eq!(
            backend_url(&prefixed, &uri),
            "http://fdo.internal/owner/fdo/101/msg/60"
        );
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, "keep-alive".parse().unwrap());
        headers.insert(TRANSFER_ENCODING, "chunked".parse().unwrap());
        headers.insert("Message-Type", "71".parse().unwrap());

        strip_hop_by_hop(&mut headers);

        assert!(headers.get(CONNECTION).is_none());
        assert!(headers.get(TRANSFER_ENCODING).is_none());
        assert_eq!(headers.get("Message-Type").unwrap(), "71");
    }

    #[test]
    fn test_headers_named_by_connection_are_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, "close, X-Hop-Trace".parse().unwrap());
        headers.append(CONNECTION, "x-session-pin".parse().unwrap());
        headers.insert("X-Hop-Trace", "abc".parse().unwrap());
        headers.insert("X-Session-Pin", "1".parse().unwrap());
        headers.insert("Message-Type", "11".parse().unwrap());

        strip_hop_by_hop(&mut headers);

        assert!(headers.get("X-Hop-Trace").is_none());
        assert!(headers.get("X-Session-Pin").is_none());
        assert!(headers.get(CONNECTION).is_none());
        assert_eq!(headers.get("Message-Type").unwrap(), "11");
    }

    #[test]
    fn test_head_response_keeps_content_length() {
        let mut upstream = HeaderMap::new();
        upstream.insert(CONTENT_LENGTH, "512".parse().unwrap());
        upstream.insert(TRANSFER_ENCODING, "chunked".parse().unwrap());

        let head = backend_response_headers(&upstream, true);
        assert_eq!(head.get(CONTENT_LENGTH).unwrap(), "512");
        assert!(head.get(TRANSFER_ENCODING).is_none());

        let get = backend_response_headers(&upstream, false);
        assert!(get.get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_invalid_backend_rejected() {
        assert!(ProxyState::new("not a url", MiddlewareChain::new(), 1024).is_err());
    }
}
