//! MIME type detection module
//!
//! Returns the Content-Type for an asset based on its file extension. Types
//! used by the game build are pinned here; anything else is looked up in the
//! `mime_guess` database.

use std::borrow::Cow;
use std::path::Path;

const OCTET_STREAM: &str = "application/octet-stream";

/// Get MIME Content-Type for a file path
///
/// # Examples
/// ```
/// use std::path::Path;
/// use vibecrossing_server::http::mime::content_type_for;
/// assert_eq!(content_type_for(Path::new("index.html")), "text/html; charset=utf-8");
/// assert_eq!(content_type_for(Path::new("assets/app.js")), "application/javascript");
/// assert_eq!(content_type_for(Path::new("LICENSE")), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> Cow<'static, str> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Cow::Borrowed(OCTET_STREAM);
    };
    let ext = ext.to_ascii_lowercase();

    if let Some(known) = get_content_type(&ext) {
        return Cow::Borrowed(known);
    }

    mime_guess::from_ext(&ext)
        .first()
        .map_or(Cow::Borrowed(OCTET_STREAM), |m| Cow::Owned(m.to_string()))
}

/// Pinned types for the extensions a web game build ships
fn get_content_type(extension: &str) -> Option<&'static str> {
    let content_type = match extension {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "txt" | "md" => "text/plain; charset=utf-8",
        "xml" => "application/xml",

        // JavaScript/WASM
        "js" | "mjs" => "application/javascript",
        "map" | "json" => "application/json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",

        // Video
        "mp4" => "video/mp4",
        "webm" => "video/webm",

        // Models and textures
        "glb" => "model/gltf-binary",
        "gltf" => "model/gltf+json",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        _ => return None,
    };
    Some(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_type(name: &str) -> String {
        content_type_for(Path::new(name)).into_owned()
    }

    #[test]
    fn test_common_types() {
        assert_eq!(content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type("styles.css"), "text/css");
        assert_eq!(content_type("main.js"), "application/javascript");
        assert_eq!(content_type("data.json"), "application/json");
        assert_eq!(content_type("tiles.png"), "image/png");
        assert_eq!(content_type("photo.jpg"), "image/jpeg");
        assert_eq!(content_type("logo.svg"), "image/svg+xml");
        assert_eq!(content_type("fish.glb"), "model/gltf-binary");
    }

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(content_type("SPRITE.PNG"), "image/png");
        assert_eq!(content_type("Index.HTML"), "text/html; charset=utf-8");
    }

    #[test]
    fn test_fallback_to_mime_database() {
        assert_eq!(content_type("manual.pdf"), "application/pdf");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type("blob.xyzunknown"), OCTET_STREAM);
        assert_eq!(content_type("Makefile"), OCTET_STREAM);
        assert_eq!(content_type(".hidden"), OCTET_STREAM);
    }
}
