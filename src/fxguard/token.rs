//! Stateless verification of HS256 session tokens.
//!
//! Tokens are compact `header.payload.signature` strings. Only the signature
//! is checked; expiry and audience are the issuer's concern.

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Outcome of verifying a session token.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// Signature matches; carries the decoded payload.
    Valid(Claims),
    /// Missing, malformed or wrongly signed token.
    Invalid,
    /// No secret configured or the MAC could not be keyed.
    Unavailable,
}

impl Verification {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Decoded token payload. Only ever produced after the signature matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    #[must_use]
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }
}

/// Verify `token` against the shared HMAC secret.
#[must_use]
pub fn verify(token: &str, secret: Option<&SecretString>) -> Verification {
    let Some(secret) = secret.filter(|s| !s.expose_secret().is_empty()) else {
        warn!("No JWT secret configured, treating session as anonymous");
        return Verification::Unavailable;
    };

    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        debug!("token does not have three segments");
        return Verification::Invalid;
    };

    let Some(signature) = decode_base64url(signature) else {
        debug!("token signature is not valid base64url");
        return Verification::Invalid;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            warn!("Unable to key HMAC-SHA-256: {e}");
            return Verification::Unavailable;
        }
    };
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("token signature mismatch");
        return Verification::Invalid;
    }

    Verification::Valid(decode_claims(payload))
}

/// Decode a base64url segment, padded or not.
///
/// The URL-safe alphabet is translated to the standard one and padded to a
/// multiple of four; a remainder of one can never be valid. Non-canonical
/// encodings (stray bits in the last symbol) are rejected.
fn decode_base64url(segment: &str) -> Option<Vec<u8>> {
    let mut b64: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();

    match b64.len() % 4 {
        0 => {}
        1 => return None,
        rem => b64.extend(std::iter::repeat('=').take(4 - rem)),
    }

    let decoded = Base64::decode_vec(&b64).ok()?;
    (Base64::encode_string(&decoded) == b64).then_some(decoded)
}

fn decode_claims(payload: &str) -> Claims {
    decode_base64url(payload)
        .and_then(|bytes| serde_json::from_slice::<Map<String, Value>>(&bytes).ok())
        .map(Claims)
        .unwrap_or_default()
}
