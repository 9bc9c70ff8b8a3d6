//! HTTP protocol layer module
//!
//! Provides content negotiation, cache headers, MIME detection and response builders,
//! decoupled from the request pipeline.

pub mod cache_control;
pub mod encoding;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cache_control::{CacheControlRules, CachePolicy};
pub use encoding::{ContentNegotiator, EncodingVariant};
pub use response::{build_401_response, build_404_response, build_500_response};
