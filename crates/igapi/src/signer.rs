//! Device identifiers and request signatures.
//!
//! Everything here is pure: no I/O, no session state. The signed body format
//! is `ig_sig_key_version=<V>&signed_body=<hex hmac>.<url-encoded payload>`.

use crate::config::{SIG_KEY, SIG_KEY_VERSION};
use crate::error::{IgError, Result};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

const DEVICE_ID_PREFIX: &str = "android-";
const DEVICE_ID_SALT: &str = "12345";
const DEVICE_ID_HEX_LEN: usize = 16;

const VERSION_PREFIX: &str = "ig_sig_key_version=";
const BODY_SEPARATOR: &str = "&signed_body=";

/// Hex MD5 of `username || password`, the seed fed to [`device_id`].
pub fn credential_seed(username: &str, password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(username.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stable per-installation device id: `android-` plus 16 hex chars.
pub fn device_id(seed: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(seed.as_bytes());
    hasher.update(DEVICE_ID_SALT.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{DEVICE_ID_PREFIX}{}", &digest[..DEVICE_ID_HEX_LEN])
}

/// Random v4 UUID, with or without hyphens.
pub fn generate_uuid(hyphenated: bool) -> String {
    let id = uuid::Uuid::new_v4();
    if hyphenated {
        id.hyphenated().to_string()
    } else {
        id.simple().to_string()
    }
}

/// A body ready to be POSTed to an authenticated endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBody(String);

impl SignedBody {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SignedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Components of a signed body, as recovered by [`Signer::decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedParts {
    pub key_version: String,
    pub digest: String,
    pub payload: String,
}

/// HMAC-SHA256 signer keyed with the application secret.
#[derive(Clone)]
pub struct Signer {
    key: String,
    key_version: String,
}

impl Default for Signer {
    fn default() -> Self {
        Self::new(SIG_KEY, SIG_KEY_VERSION)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("key", &"[REDACTED]")
            .field("key_version", &self.key_version)
            .finish()
    }
}

impl Signer {
    pub fn new(key: impl Into<String>, key_version: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            key_version: key_version.into(),
        }
    }

    pub fn key_version(&self) -> &str {
        &self.key_version
    }

    /// Lowercase hex HMAC-SHA256 of `body`.
    pub fn digest(&self, body: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(body.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Sign `body` into the wire format.
    pub fn sign(&self, body: &str) -> SignedBody {
        SignedBody(format!(
            "{VERSION_PREFIX}{}{BODY_SEPARATOR}{}.{}",
            self.key_version,
            self.digest(body),
            quote(body)
        ))
    }

    /// Split a signed body back into its parts. Does not check the digest.
    pub fn decode(signed: &str) -> Result<SignedParts> {
        let invalid = |why: &str| IgError::InvalidPayload(format!("signed body: {why}"));

        let rest = signed
            .strip_prefix(VERSION_PREFIX)
            .ok_or_else(|| invalid("missing key version"))?;
        let (key_version, rest) = rest
            .split_once(BODY_SEPARATOR)
            .ok_or_else(|| invalid("missing signed_body"))?;
        let (digest, encoded) = rest
            .split_once('.')
            .ok_or_else(|| invalid("missing digest separator"))?;
        let payload = urlencoding::decode(encoded)
            .map_err(|e| invalid(&format!("payload is not UTF-8: {e}")))?
            .into_owned();

        Ok(SignedParts {
            key_version: key_version.to_string(),
            digest: digest.to_string(),
            payload,
        })
    }

    /// Decode and check the digest against this signer's key; returns the payload.
    pub fn verify(&self, signed: &str) -> Result<String> {
        let parts = Self::decode(signed)?;
        if parts.key_version != self.key_version {
            return Err(IgError::InvalidPayload(format!(
                "key version {} does not match {}",
                parts.key_version, self.key_version
            )));
        }
        if parts.digest != self.digest(&parts.payload) {
            return Err(IgError::InvalidPayload("digest mismatch".to_string()));
        }
        Ok(parts.payload)
    }
}

/// Percent-encode everything outside `A-Za-z0-9_.-~`, but keep `/` literal.
fn quote(body: &str) -> String {
    // A literal "%2F" in the input is itself encoded as "%252F", so this is exact.
    urlencoding::encode(body).replace("%2F", "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn device_id_matches_known_vector() {
        let seed = credential_seed("alice", "hunter2");
        assert_eq!(seed, "bb6de2fa07892f34b0e1f62df88f3384");
        assert_eq!(device_id(&seed), "android-f309e4c7bad9374d");
    }

    #[test]
    fn device_id_shape_and_determinism() {
        for seed in ["", "x", "some much longer seed value"] {
            let id = device_id(seed);
            assert_eq!(id, device_id(seed));
            let suffix = id.strip_prefix("android-").expect("prefix");
            assert_eq!(suffix.len(), 16);
            assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        }
        assert_ne!(device_id("a"), device_id("b"));
    }

    #[test]
    fn sign_matches_known_vector() {
        let signed = Signer::default().sign(r#"{"media_id":"123"}"#);
        assert_eq!(
            signed.as_str(),
            "ig_sig_key_version=4&signed_body=\
             c2296a98c6930197c1464431cd06157c7f1003172accf52c804ff060c8d8f4a6.\
             %7B%22media_id%22%3A%22123%22%7D"
        );
    }

    #[test]
    fn sign_keeps_slash_and_escapes_space() {
        let signed = Signer::default().sign(r#"{"a":"b/c d"}"#);
        assert_eq!(
            signed.as_str(),
            "ig_sig_key_version=4&signed_body=\
             485db7817c7a672df292c4de4e1b0b97d3ddad3413d4e8aed04965f89bb3170a.\
             %7B%22a%22%3A%22b/c%20d%22%7D"
        );
    }

    #[test]
    fn sign_is_deterministic_and_well_formed() {
        let signer = Signer::default();
        let body = r#"{"_uuid":"u","comment_text":"héllo & 100%"}"#;
        let first = signer.sign(body);
        assert_eq!(first, signer.sign(body));

        let parts = Signer::decode(first.as_str()).expect("decode");
        assert_eq!(parts.key_version, "4");
        assert_eq!(parts.digest.len(), 64);
        assert!(parts.digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn decode_recovers_payload_bytes() {
        let signer = Signer::default();
        let body = r#"{"text":"a/b?c=d&e=%2F","emoji":"🙂"}"#;
        let signed = signer.sign(body);
        assert_eq!(signer.verify(signed.as_str()).expect("verify"), body);
    }

    #[test]
    fn verify_rejects_tampering_and_other_keys() {
        let signed = Signer::default().sign(r#"{"a":"1"}"#).into_string();
        let tampered = signed.replace("%221%22", "%222%22");
        assert!(Signer::default().verify(&tampered).is_err());
        assert!(Signer::new("other-key", "4").verify(&signed).is_err());
        assert!(Signer::new(SIG_KEY, "5").verify(&signed).is_err());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Signer::decode("signed_body=abc").is_err());
        assert!(Signer::decode("ig_sig_key_version=4").is_err());
        assert!(Signer::decode("ig_sig_key_version=4&signed_body=nodot").is_err());
    }

    #[test]
    fn uuid_forms() {
        let hyphenated = generate_uuid(true);
        assert_eq!(hyphenated.len(), 36);
        assert_eq!(hyphenated.matches('-').count(), 4);

        let simple = generate_uuid(false);
        assert_eq!(simple.len(), 32);
        assert!(!simple.contains('-'));
    }

    #[test]
    fn debug_redacts_key() {
        let dbg = format!("{:?}", Signer::default());
        assert!(!dbg.contains(SIG_KEY));
        assert!(dbg.contains("[REDACTED]"));
    }
}
