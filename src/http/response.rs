//! HTTP response building module
//!
//! Builders for every status the asset server produces. Error bodies are a
//! short status line only; paths and I/O details never reach the client.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

use crate::http::range::RangeRequest;

/// Methods the server answers
pub const ALLOWED_METHODS: &str = "GET, HEAD";

/// Headers shared by 200 and 206 asset responses
#[derive(Debug, Clone, Copy)]
pub struct AssetHeaders<'a> {
    pub content_type: &'a str,
    pub etag: &'a str,
    pub last_modified: Option<&'a str>,
    pub cache_control: &'a str,
}

impl AssetHeaders<'_> {
    fn apply(&self, builder: Builder) -> Builder {
        let builder = builder
            .header("Content-Type", self.content_type)
            .header("Accept-Ranges", "bytes")
            .header("ETag", self.etag)
            .header("Cache-Control", self.cache_control);
        match self.last_modified {
            Some(date) => builder.header("Last-Modified", date),
            None => builder,
        }
    }
}

/// Build a plain-text error response (403, 404, 500, ...)
pub fn build_error_response(status: StatusCode) -> Response<Full<Bytes>> {
    let body = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(body.clone())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from(body)))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    let mut response = build_error_response(StatusCode::METHOD_NOT_ALLOWED);
    response.headers_mut().insert(
        hyper::header::ALLOW,
        hyper::header::HeaderValue::from_static(ALLOWED_METHODS),
    );
    response
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str, last_modified: Option<&str>) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", etag);
    if let Some(date) = last_modified {
        builder = builder.header("Last-Modified", date);
    }
    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("304", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: usize) -> Response<Full<Bytes>> {
    let mut response = build_error_response(StatusCode::RANGE_NOT_SATISFIABLE);
    if let Ok(value) = hyper::header::HeaderValue::from_str(&format!("bytes */{file_size}")) {
        response
            .headers_mut()
            .insert(hyper::header::CONTENT_RANGE, value);
    }
    response
}

/// Build 200 response carrying a whole asset
///
/// For HEAD requests the body is dropped but `Content-Length` still reports
/// the asset size.
pub fn build_asset_response(
    data: Bytes,
    headers: &AssetHeaders<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    headers
        .apply(Response::builder().status(StatusCode::OK))
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

/// Build 206 Partial Content response for a single byte range of `data`
pub fn build_partial_response(
    data: &Bytes,
    range: &RangeRequest,
    headers: &AssetHeaders<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let body = if is_head {
        Bytes::new()
    } else {
        data.slice(range.start..=range.end)
    };

    headers
        .apply(Response::builder().status(StatusCode::PARTIAL_CONTENT))
        .header("Content-Length", range.content_length())
        .header("Content-Range", range.content_range(data.len()))
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
