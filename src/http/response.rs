//! HTTP response building module
//!
//! Provides builders for the handful of responses the server emits.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    CACHE_CONTROL, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, VARY, WWW_AUTHENTICATE,
};
use hyper::{Response, StatusCode};

use crate::cache::ResponseItem;
use crate::http::cache_control::CachePolicy;

/// Build 200 response for a cached (or freshly read) item
pub fn build_item_response(item: &ResponseItem, policy: CachePolicy) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, item.content_type.as_str())
        .header(CONTENT_LENGTH, item.len())
        .header(CACHE_CONTROL, policy.to_header_value())
        .header(VARY, "Accept-Encoding");

    if let Some(encoding) = item.variant.content_encoding() {
        builder = builder.header(CONTENT_ENCODING, encoding);
    }

    builder
        .body(Full::new(item.payload.clone()))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
///
/// Also used for rejected paths, so it must not say anything about the tree.
pub fn build_404_response() -> Response<Full<Bytes>> {
    plain_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    plain_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// Build 401 Unauthorized response with a Basic challenge
pub fn build_401_response(realm: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(WWW_AUTHENTICATE, format!("Basic realm=\"{realm}\""))
        .body(Full::new(Bytes::from_static(b"401 Unauthorized")))
        .unwrap_or_else(|e| {
            log_build_error("401", &e);
            let mut resp = Response::new(Full::new(Bytes::from_static(b"401 Unauthorized")));
            *resp.status_mut() = StatusCode::UNAUTHORIZED;
            resp
        })
}

fn plain_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            let mut resp = Response::new(Full::new(Bytes::from_static(text.as_bytes())));
            *resp.status_mut() = status;
            resp
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
