//! Static file serving module
//!
//! Resolves the request path, negotiates an encoding and answers from the
//! response cache.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;

use crate::cache::INDEX_DOCUMENT;
use crate::config::AppState;
use crate::handler::path;
use crate::http::{self, mime, EncodingVariant};
use crate::logger;

/// Serve `request_path` (still percent-encoded) with the given `Accept-Encoding`
pub async fn serve(
    state: &AppState,
    request_path: &str,
    accept_encoding: Option<&str>,
) -> Response<Full<Bytes>> {
    let Some(relative) = resolve_request_path(request_path, state.config.files.spa_mode) else {
        return http::build_404_response();
    };

    let variant = state.negotiator.select_variant(accept_encoding);
    let content_type = mime::content_type_for(Path::new(&relative));

    let mut result = state
        .cache
        .get_or_create(&relative, variant, content_type)
        .await;

    // No sidecar for this file (e.g. below the compression threshold)
    if variant != EncodingVariant::Identity && result.as_ref().is_err_and(|e| e.is_not_found()) {
        result = state
            .cache
            .get_or_create(&relative, EncodingVariant::Identity, content_type)
            .await;
    }

    match result {
        Ok(item) => {
            let policy = state.cache_rules.policy_for(&item.relative_path);
            http::response::build_item_response(&item, policy)
        }
        Err(e) if e.is_not_found() => http::build_404_response(),
        Err(e) => {
            logger::log_error(&e.to_string());
            http::build_500_response()
        }
    }
}

/// Decode and clean the request path
///
/// A path that cannot be decoded or escapes the root becomes the index document
/// in SPA mode and a plain miss otherwise.
fn resolve_request_path(request_path: &str, spa_mode: bool) -> Option<String> {
    let resolved = urlencoding::decode(request_path)
        .ok()
        .and_then(|decoded| path::resolve(&decoded));

    match resolved {
        Some(relative) => Some(relative),
        None if spa_mode => Some(INDEX_DOCUMENT.to_string()),
        None => None,
    }
}
