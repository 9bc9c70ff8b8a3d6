//! Precompression of the served tree into `.gz`/`.br` sidecar files

pub mod engine;

pub use engine::{encode, CompressionEngine, CompressionReport};
