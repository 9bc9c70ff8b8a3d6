//! Cached response payloads

use hyper::body::Bytes;

use crate::http::encoding::EncodingVariant;

/// Identifies one cached payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Normalized path relative to the served root
    pub path: String,
    pub variant: EncodingVariant,
}

impl CacheKey {
    pub fn new(path: impl Into<String>, variant: EncodingVariant) -> Self {
        Self {
            path: path.into(),
            variant,
        }
    }
}

/// An immutable response body together with the headers derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseItem {
    /// Base name of the file that was read, e.g. `vite.svg.br`
    pub name: String,
    /// Relative path of the logical resource, after directory/SPA redirection
    pub relative_path: String,
    pub content_type: String,
    pub payload: Bytes,
    pub variant: EncodingVariant,
}

impl ResponseItem {
    pub const fn new(
        name: String,
        relative_path: String,
        content_type: String,
        payload: Bytes,
        variant: EncodingVariant,
    ) -> Self {
        Self {
            name,
            relative_path,
            content_type,
            payload,
            variant,
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload size as counted against the cache budget
    pub fn size(&self) -> u64 {
        u64::try_from(self.payload.len()).unwrap_or(u64::MAX)
    }
}
