//! HTTP Basic authentication gate

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hyper::header::AUTHORIZATION;
use hyper::HeaderMap;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::logger;

/// Realm advertised when none is configured
pub const DEFAULT_REALM: &str = "Restricted";

/// Configured credential pair
#[derive(Debug, Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
    realm: String,
}

impl BasicAuth {
    /// Build the gate from configuration
    ///
    /// Returns `None` when no credentials are configured, or when the credential
    /// string has no `:` separator. In both cases every request passes through.
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        let credentials = config.basic_auth.as_deref().filter(|c| !c.is_empty())?;

        let Some((username, password)) = credentials.split_once(':') else {
            logger::log_warning(
                "auth.basic_auth must be in 'user:pass' form, authentication disabled",
            );
            return None;
        };

        let realm = match config.realm.as_deref().filter(|r| !r.is_empty()) {
            None => DEFAULT_REALM.to_string(),
            Some(realm) => sanitize_realm(realm).unwrap_or_else(|| {
                logger::log_warning(&format!(
                    "auth.realm contains control characters, using \"{DEFAULT_REALM}\""
                ));
                DEFAULT_REALM.to_string()
            }),
        };

        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
            realm,
        })
    }

    /// Realm as it appears between the quotes of the challenge
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Whether the request carries the configured credentials
    pub fn check(&self, headers: &HeaderMap) -> bool {
        let Some(encoded) = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| strip_scheme(v.trim()))
        else {
            return false;
        };

        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };
        let Some((username, password)) = decoded.split_once(':') else {
            return false;
        };

        // Evaluate both so timing does not reveal which half matched
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        user_ok & pass_ok
    }
}

/// Strip a case-insensitive `Basic ` prefix
fn strip_scheme(value: &str) -> Option<&str> {
    let (scheme, rest) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("basic").then_some(rest)
}

/// Compare SHA-256 digests in constant time so neither content nor length leaks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let hash_a = Sha256::digest(a);
    let hash_b = Sha256::digest(b);
    hash_a.ct_eq(&hash_b).into()
}

/// Make a configured realm safe inside a quoted `WWW-Authenticate` parameter
///
/// Returns `None` when the realm holds characters a header value cannot carry.
fn sanitize_realm(realm: &str) -> Option<String> {
    if realm.chars().any(|c| c.is_control()) {
        return None;
    }
    let mut quoted = String::with_capacity(realm.len());
    for c in realm.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    Some(quoted)
}
