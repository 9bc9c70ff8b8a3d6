//! Request path resolution
//!
//! Lexical only: the filesystem is never consulted and symbolic links are not
//! followed or checked.

/// Clean a request path into a path relative to the served root
///
/// `.` and empty segments are dropped and `..` removes the previous segment. A
/// leading `/` denotes the served root. Returns `None` when the cleaned path would
/// climb above the root; callers answer that exactly like a missing file.
///
/// The root itself resolves to the empty string.
///
/// # Examples
/// ```
/// use spa_server::handler::path::resolve;
///
/// assert_eq!(resolve("/assets/./app.js").as_deref(), Some("assets/app.js"));
/// assert_eq!(resolve("test/../index.html").as_deref(), Some("index.html"));
/// assert_eq!(resolve("../test/index.html"), None);
/// ```
pub fn resolve(request_path: &str) -> Option<String> {
    if request_path.contains('\0') {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            name => segments.push(name),
        }
    }

    Some(segments.join("/"))
}
