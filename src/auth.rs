//! Request signing for the openQA API.
//!
//! Non-GET requests (and GETs, when credentials are configured) carry three
//! headers: the API key, a microsecond-precision timestamp, and an HMAC-SHA1
//! digest over the request's canonical path plus that timestamp. The server
//! reconstructs the same string, so the canonicalization here has to match
//! it byte-for-byte; see openQA/lib/OpenQA/client.pm for the design.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use reqwest::Url;
use sha1::Sha1;

use crate::error::{Error, Result};

pub(crate) const API_KEY_HEADER: &str = "x-api-key";
pub(crate) const MICROTIME_HEADER: &str = "x-api-microtime";
pub(crate) const HASH_HEADER: &str = "x-api-hash";

type HmacSha1 = Hmac<Sha1>;

/// Seconds since the epoch with six fractional digits. The server rejects
/// stale timestamps, which is why every retry attempt is signed afresh.
pub(crate) fn microtime() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// The canonical form of a request path: the encoded path plus query, with
/// the two substitutions the server applies (`%20` to `+`, `~` to `%7E`).
pub(crate) fn canonical_path(url: &Url) -> String {
    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    path.replace("%20", "+").replace('~', "%7E")
}

/// Computes the hex HMAC-SHA1 digest over `path` + `microtime`, keyed by
/// the API secret.
pub(crate) fn sign(path: &str, microtime: &str, secret: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Signature(format!("HMAC key error: {}", e)))?;
    mac.update(path.as_bytes());
    mac.update(microtime.as_bytes());
    let digest = mac.finalize().into_bytes();
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}
