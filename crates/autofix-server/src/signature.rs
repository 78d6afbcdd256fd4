// SPDX-License-Identifier: Apache-2.0

//! Linear webhook signature verification.
//!
//! Linear signs each delivery with HMAC-SHA256 over the raw request body and
//! sends the hex digest in the `Linear-Signature` header.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded signature.
pub const SIGNATURE_HEADER: &str = "linear-signature";

fn mac(secret: &SecretString, body: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()).ok()?;
    mac.update(body);
    Some(mac)
}

/// Hex signature of `body` under `secret`.
#[must_use]
pub fn sign(secret: &SecretString, body: &[u8]) -> String {
    mac(secret, body)
        .map(|m| hex::encode(m.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Checks `signature` against `body` in constant time.
///
/// A missing or non-hex signature never verifies.
#[must_use]
pub fn verify(secret: &SecretString, body: &[u8], signature: Option<&str>) -> bool {
    let Some(expected) = signature.and_then(|s| hex::decode(s.trim()).ok()) else {
        return false;
    };
    mac(secret, body).is_some_and(|m| m.verify_slice(&expected).is_ok())
}
