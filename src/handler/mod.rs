//! Request handler module
//!
//! Authentication gate, path resolution and static serving.

pub mod auth;
pub mod path;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
