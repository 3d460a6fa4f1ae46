//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, dispatch to
//! the asset loader, common headers and access logging.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
    pub range_header: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self {
            path: req.uri().path(),
            is_head: req.method() == Method::HEAD,
            if_none_match: header_str(req, "if-none-match"),
            if_modified_since: header_str(req, "if-modified-since"),
            range_header: header_str(req, "range"),
        }
    }
}

/// Header value as text, `None` if absent or not visible ASCII
fn header_str<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Main entry point for HTTP request handling
///
/// Request bodies are never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let mut response = dispatch(&req, &state).await;

    if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, value);
    }

    if state.config.logging.access_log {
        log_access(&req, &response, peer_addr, started, &state);
    }

    Ok(response)
}

async fn dispatch<B>(req: &Request<B>, state: &AppState) -> Response<Full<Bytes>> {
    if let Some(resp) = check_http_method(req.method()) {
        return resp;
    }

    // `/` and `/<path>` share one code path: an empty normalized path is
    // answered with the index file.
    let ctx = RequestContext::from_request(req);
    static_files::serve(&ctx, state).await
}

/// Return 405 for anything but GET/HEAD
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => {
            logger::log_debug(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

fn log_access<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header_str(req, "referer").map(ToString::to_string);
    entry.user_agent = header_str(req, "user-agent").map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn test_state() -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dist");
        std::fs::create_dir_all(root.join("levels")).unwrap();
        std::fs::write(root.join("index.html"), "<html>OK</html>").unwrap();
        std::fs::write(root.join("styles.css"), "body{}").unwrap();
        std::fs::write(root.join("app.js"), "console.log(1)").unwrap();
        std::fs::write(dir.path().join("server.py"), "print('secret')").unwrap();

        let mut cfg = Config::load_from("this-config-file-does-not-exist", None).unwrap();
        cfg.assets.root = root.to_string_lossy().into_owned();
        cfg.logging.access_log = false;
        (dir, Arc::new(AppState::new(cfg).unwrap()))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<()>) -> Response<Full<Bytes>> {
        handle_request(req, Arc::clone(state), peer()).await.unwrap()
    }

    fn get(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let (_dir, state) = test_state();
        let response = send(&state, get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        assert_eq!(response.headers()["server"], "vibecrossing-server");
        assert_eq!(body_of(response).await, "<html>OK</html>");
    }

    #[tokio::test]
    async fn test_asset_with_content_type() {
        let (_dir, state) = test_state();
        let response = send(&state, get("/styles.css")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/css");
        assert_eq!(body_of(response).await, "body{}");

        let response = send(&state, get("/app.js?v=2")).await;
        assert_eq!(response.headers()["content-type"], "application/javascript");
    }

    #[tokio::test]
    async fn test_missing_directory_and_traversal() {
        let (_dir, state) = test_state();
        assert_eq!(
            send(&state, get("/missing.txt")).await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            send(&state, get("/levels/")).await.status(),
            StatusCode::NOT_FOUND
        );

        let response = send(&state, get("/../server.py")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_of(response).await;
        assert!(!String::from_utf8_lossy(&body).contains("secret"));
    }

    #[tokio::test]
    async fn test_head_and_other_methods() {
        let (_dir, state) = test_state();
        let head = Request::builder()
            .method(Method::HEAD)
            .uri("/styles.css")
            .body(())
            .unwrap();
        let response = send(&state, head).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-length"], "6");
        assert!(body_of(response).await.is_empty());

        for method in [Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS] {
            let req = Request::builder().method(method).uri("/").body(()).unwrap();
            let response = send(&state, req).await;
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(response.headers()["allow"], "GET, HEAD");
        }
    }

    #[tokio::test]
    async fn test_conditional_get() {
        let (_dir, state) = test_state();
        let first = send(&state, get("/styles.css")).await;
        let etag = first.headers()["etag"].clone();
        let last_modified = first.headers()["last-modified"].clone();

        let req = Request::builder()
            .uri("/styles.css")
            .header("If-None-Match", etag)
            .body(())
            .unwrap();
        let response = send(&state, req).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(body_of(response).await.is_empty());

        let req = Request::builder()
            .uri("/styles.css")
            .header("If-Modified-Since", last_modified)
            .body(())
            .unwrap();
        assert_eq!(send(&state, req).await.status(), StatusCode::NOT_MODIFIED);

        // A stale ETag wins over a current date
        let req = Request::builder()
            .uri("/styles.css")
            .header("If-None-Match", "\"stale\"")
            .header("If-Modified-Since", "Fri, 01 Jan 2100 00:00:00 GMT")
            .body(())
            .unwrap();
        assert_eq!(send(&state, req).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_range_requests() {
        let (_dir, state) = test_state();
        let req = Request::builder()
            .uri("/app.js")
            .header("Range", "bytes=0-6")
            .body(())
            .unwrap();
        let response = send(&state, req).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()["content-range"], "bytes 0-6/14");
        assert_eq!(body_of(response).await, "console");

        let req = Request::builder()
            .uri("/app.js")
            .header("Range", "bytes=100-")
            .body(())
            .unwrap();
        let response = send(&state, req).await;
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()["content-range"], "bytes */14");
    }

    #[test]
    fn test_version_label() {
        assert_eq!(version_label(Version::HTTP_10), "1.0");
        assert_eq!(version_label(Version::HTTP_11), "1.1");
        assert_eq!(version_label(Version::HTTP_2), "2");
    }
}
