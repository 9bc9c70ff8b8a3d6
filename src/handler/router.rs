//! Request dispatch module
//!
//! Entry point for HTTP request processing: authentication, static serving and
//! access logging.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, ACCEPT_ENCODING, CONTENT_ENCODING, REFERER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
///
/// Every method is routed the same way; the body is dropped unread.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();

    let response = if let Some(auth) = state.auth.as_ref().filter(|a| !a.check(&parts.headers)) {
        http::build_401_response(auth.realm())
    } else {
        let accept_encoding = parts
            .headers
            .get(ACCEPT_ENCODING)
            .and_then(|v| v.to_str().ok());
        static_files::serve(&state, parts.uri.path(), accept_encoding).await
    };

    if state.access_log_enabled() {
        let entry = access_entry(&parts, &response, peer_addr, started);
        logger::log_access(&entry, &state.access_log_format);
    }

    Ok(response)
}

fn access_entry(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let header = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = hyper::body::Body::size_hint(response.body())
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.content_encoding = response
        .headers()
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
