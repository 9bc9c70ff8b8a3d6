//! Content negotiation module
//!
//! Picks which encoded variant of a resource to serve from the client's
//! `Accept-Encoding` header and the codecs the server has precompressed.

use std::fmt;

/// One encoded form of a logical resource
///
/// Declaration order is server preference, lowest first: Brotli > Gzip > Identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EncodingVariant {
    Identity,
    Gzip,
    Brotli,
}

impl EncodingVariant {
    /// Compressed variants in server preference order
    pub const PREFERENCE: [Self; 2] = [Self::Brotli, Self::Gzip];

    /// `Content-Encoding` token, `None` for identity
    pub const fn content_encoding(self) -> Option<&'static str> {
        match self {
            Self::Identity => None,
            Self::Gzip => Some("gzip"),
            Self::Brotli => Some("br"),
        }
    }

    /// Sidecar file extension, `None` for identity
    pub const fn sidecar_extension(self) -> Option<&'static str> {
        match self {
            Self::Identity => None,
            Self::Gzip => Some("gz"),
            Self::Brotli => Some("br"),
        }
    }
}

impl fmt::Display for EncodingVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_encoding().unwrap_or("identity"))
    }
}

/// Selects response variants for one server configuration
#[derive(Debug, Clone, Copy)]
pub struct ContentNegotiator {
    gzip: bool,
    brotli: bool,
}

impl ContentNegotiator {
    pub const fn new(gzip: bool, brotli: bool) -> Self {
        Self { gzip, brotli }
    }

    const fn enabled(self, variant: EncodingVariant) -> bool {
        match variant {
            EncodingVariant::Identity => true,
            EncodingVariant::Gzip => self.gzip,
            EncodingVariant::Brotli => self.brotli,
        }
    }

    /// Pick the best variant both sides support
    ///
    /// Only encodings the client declared (directly or through `*`) are ever
    /// chosen; anything else falls back to identity.
    ///
    /// # Examples
    /// ```
    /// use spa_server::http::encoding::{ContentNegotiator, EncodingVariant};
    ///
    /// let negotiator = ContentNegotiator::new(true, true);
    /// assert_eq!(negotiator.select_variant(Some("*")), EncodingVariant::Brotli);
    /// assert_eq!(negotiator.select_variant(Some("gzip, deflate")), EncodingVariant::Gzip);
    /// assert_eq!(negotiator.select_variant(None), EncodingVariant::Identity);
    /// ```
    pub fn select_variant(self, accept_encoding: Option<&str>) -> EncodingVariant {
        let Some(header) = accept_encoding else {
            return EncodingVariant::Identity;
        };
        let accepted = AcceptedEncodings::parse(header);

        EncodingVariant::PREFERENCE
            .into_iter()
            .find(|v| self.enabled(*v) && accepted.accepts(*v))
            .unwrap_or(EncodingVariant::Identity)
    }
}

/// Parsed `Accept-Encoding` header
#[derive(Debug, Default)]
struct AcceptedEncodings {
    gzip: Option<bool>,
    brotli: Option<bool>,
    wildcard: Option<bool>,
}

impl AcceptedEncodings {
    fn parse(header: &str) -> Self {
        let mut accepted = Self::default();

        for token in header.split(',') {
            let mut parts = token.split(';');
            let coding = parts.next().unwrap_or("").trim();
            let allowed = !parts.any(is_zero_quality);

            let slot = if coding.eq_ignore_ascii_case("gzip") || coding.eq_ignore_ascii_case("x-gzip") {
                &mut accepted.gzip
            } else if coding.eq_ignore_ascii_case("br") {
                &mut accepted.brotli
            } else if coding == "*" {
                &mut accepted.wildcard
            } else {
                continue;
            };
            *slot = Some(allowed);
        }

        accepted
    }

    fn accepts(&self, variant: EncodingVariant) -> bool {
        let explicit = match variant {
            EncodingVariant::Identity => return true,
            EncodingVariant::Gzip => self.gzip,
            EncodingVariant::Brotli => self.brotli,
        };
        explicit.or(self.wildcard).unwrap_or(false)
    }
}

/// `q=0` (with any number of trailing zeros) refuses a coding
fn is_zero_quality(param: &str) -> bool {
    let Some((name, value)) = param.split_once('=') else {
        return false;
    };
    name.trim().eq_ignore_ascii_case("q")
        && value
            .trim()
            .parse::<f32>()
            .is_ok_and(|q| q <= 0.0)
}
