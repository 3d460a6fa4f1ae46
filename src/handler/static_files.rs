//! Static file serving module
//!
//! Maps a request path onto the asset root, loads the file and builds the
//! response, honoring conditional and range headers.
//!
//! Containment is enforced twice: lexically, by refusing `..` segments that
//! climb above the root, and on disk, by requiring the canonical target
//! (symlinks resolved) to live under the canonical root.

use std::borrow::Cow;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::config::AppState;
use crate::error::ServeError;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, RangeParseResult};
use crate::logger;

/// An asset read from disk
#[derive(Debug)]
pub struct StaticFile {
    pub content: Bytes,
    pub content_type: Cow<'static, str>,
    pub modified: Option<SystemTime>,
}

/// Serve the asset addressed by the request path
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    match load(&state.asset_root, ctx.path, &state.config.assets.index_file).await {
        Ok(file) => build_static_file_response(ctx, &file, &state.config.http.cache_control),
        Err(err) => {
            match &err {
                ServeError::NotFound => logger::log_debug(&format!("Not found: {}", ctx.path)),
                ServeError::Forbidden => logger::log_warning(&format!(
                    "Path traversal attempt blocked: {}",
                    ctx.path
                )),
                ServeError::Internal(e) => {
                    logger::log_error(&format!("Failed to read asset '{}': {e}", ctx.path));
                }
            }
            http::build_error_response(err.status())
        }
    }
}

/// Load the asset for a request path
///
/// `/` (and anything that normalizes to it) loads `index_file`.
pub async fn load(root: &Path, request_path: &str, index_file: &str) -> Result<StaticFile, ServeError> {
    let mut relative = normalize_request_path(request_path)?;
    if relative.as_os_str().is_empty() {
        relative = PathBuf::from(index_file);
    }

    let (path, metadata) = resolve(root, &relative).await?;
    let content = fs::read(&path).await.map_err(ServeError::from_io)?;

    Ok(StaticFile {
        content: Bytes::from(content),
        content_type: mime::content_type_for(&path),
        modified: metadata.modified().ok(),
    })
}

/// Percent-decode and lexically normalize a request path
///
/// Returns the path relative to the asset root; empty means the root itself.
/// `.` and empty segments are dropped, `..` removes the previous segment.
/// A `..` with nothing left to remove, or a segment carrying a backslash or
/// NUL byte, is `Forbidden`. Paths that do not decode to UTF-8 are `NotFound`.
pub fn normalize_request_path(request_path: &str) -> Result<PathBuf, ServeError> {
    let decoded = urlencoding::decode(request_path).map_err(|_| ServeError::NotFound)?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ServeError::Forbidden);
                }
            }
            s if s.contains(['\\', '\0']) => return Err(ServeError::Forbidden),
            s => segments.push(s),
        }
    }

    Ok(segments.iter().collect())
}

/// Resolve a normalized relative path to a regular file inside `root`
///
/// `root` must already be canonical. Directories are reported as
/// `NotFound` so the layout of the asset root is never exposed.
async fn resolve(root: &Path, relative: &Path) -> Result<(PathBuf, Metadata), ServeError> {
    let canonical = fs::canonicalize(root.join(relative))
        .await
        .map_err(ServeError::from_io)?;

    if !canonical.starts_with(root) {
        return Err(ServeError::Forbidden);
    }

    let metadata = fs::metadata(&canonical).await.map_err(ServeError::from_io)?;
    if !metadata.is_file() {
        return Err(ServeError::NotFound);
    }

    Ok((canonical, metadata))
}

/// Build the response for a loaded asset
///
/// `If-None-Match` takes precedence over `If-Modified-Since`; a matching
/// validator yields 304 before any range handling.
fn build_static_file_response(
    ctx: &RequestContext<'_>,
    file: &StaticFile,
    cache_control: &str,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(&file.content);
    let last_modified = file.modified.map(cache::format_http_date);

    let not_modified = if ctx.if_none_match.is_some() {
        cache::check_etag_match(ctx.if_none_match, &etag)
    } else {
        file.modified
            .is_some_and(|m| cache::not_modified_since(ctx.if_modified_since, m))
    };
    if not_modified {
        return http::build_304_response(&etag, last_modified.as_deref());
    }

    let headers = http::AssetHeaders {
        content_type: &file.content_type,
        etag: &etag,
        last_modified: last_modified.as_deref(),
        cache_control,
    };

    match http::parse_range_header(ctx.range_header, file.content.len()) {
        RangeParseResult::Valid(range) => {
            http::build_partial_response(&file.content, &range, &headers, ctx.is_head)
        }
        RangeParseResult::NotSatisfiable => http::build_416_response(file.content.len()),
        RangeParseResult::None => {
            http::build_asset_response(file.content.clone(), &headers, ctx.is_head)
        }
    }
}
