//! MIME type detection module
//!
//! Maps the extension of the logical resource (never the sidecar) to a Content-Type.

use std::path::Path;

/// Content type used for the SPA index document
pub const HTML: &str = "text/html; charset=utf-8";

const OCTET_STREAM: &str = "application/octet-stream";

/// Get MIME Content-Type for a served file
///
/// # Examples
/// ```
/// use spa_server::http::mime::content_type_for;
/// use std::path::Path;
/// assert_eq!(content_type_for(Path::new("index.html")), "text/html; charset=utf-8");
/// assert_eq!(content_type_for(Path::new("assets/app.JS")), "text/javascript; charset=utf-8");
/// assert_eq!(content_type_for(Path::new("LICENSE")), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(OCTET_STREAM, |ext| {
            get_content_type(&ext.to_ascii_lowercase())
        })
}

/// Get MIME Content-Type based on a lowercase file extension
pub fn get_content_type(extension: &str) -> &'static str {
    match extension {
        // Documents and markup
        "html" | "htm" => HTML,
        "css" => "text/css; charset=utf-8",
        "txt" | "md" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "csv" => "text/csv; charset=utf-8",

        // Scripts and data
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "webmanifest" => "application/manifest+json",
        "wasm" => "application/wasm",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "avif" => "image/avif",

        // Media
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        // Archives
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",

        _ => OCTET_STREAM,
    }
}
