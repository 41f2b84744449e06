//! Typed request payloads.
//!
//! Endpoints build a [`Payload`] field by field, merge the session
//! identifiers in one step, then sign it (or form-encode it for the few
//! endpoints that take unsigned bodies).

use crate::error::{IgError, Result};
use crate::session::Session;
use crate::signer::{SignedBody, Signer};
use std::collections::BTreeMap;

/// Ordered string-to-string request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    fields: BTreeMap<String, String>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add `key` only when `value` is present.
    pub fn field_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge `_uuid`, `_uid` and `_csrftoken` from an authenticated session.
    pub fn with_session(self, session: &Session) -> Result<Self> {
        let uid = session.user_id()?.to_string();
        let uuid = session
            .install_uuid()
            .ok_or_else(|| IgError::not_authenticated("_uuid"))?
            .to_string();
        let csrf = session
            .csrf_token()
            .ok_or_else(|| IgError::not_authenticated("_csrftoken"))?
            .to_string();
        Ok(self
            .field("_uuid", uuid)
            .field("_uid", uid)
            .field("_csrftoken", csrf))
    }

    pub fn validate(&self) -> Result<()> {
        if self.fields.keys().any(|k| k.trim().is_empty()) {
            return Err(IgError::InvalidPayload("empty field name".to_string()));
        }
        Ok(())
    }

    /// Compact JSON object, the string that gets signed.
    pub fn to_json(&self) -> Result<String> {
        self.validate()?;
        Ok(serde_json::to_string(&self.fields)?)
    }

    pub fn sign(&self, signer: &Signer) -> Result<SignedBody> {
        Ok(signer.sign(&self.to_json()?))
    }

    /// `application/x-www-form-urlencoded` rendering for unsigned endpoints.
    pub fn to_form(&self) -> Result<String> {
        self.validate()?;
        serde_urlencoded::to_string(&self.fields)
            .map_err(|e| IgError::InvalidPayload(format!("form encoding: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Credentials;
    use pretty_assertions::assert_eq;

    fn logged_in() -> Session {
        let mut session = Session::anonymous();
        session.begin_login(
            Credentials::new("alice", "pw"),
            "android-0000000000000000".to_string(),
            "uuid-1".to_string(),
        );
        session.set_csrf_token("tok".to_string());
        session.complete_login("42".to_string()).expect("complete");
        session
    }

    #[test]
    fn json_is_compact_and_sorted() {
        let payload = Payload::new().field("media_id", "9").field("_uid", "1");
        assert_eq!(payload.to_json().expect("json"), r#"{"_uid":"1","media_id":"9"}"#);
    }

    #[test]
    fn session_merge_adds_identifiers() {
        let payload = Payload::new()
            .field("user_id", "7")
            .with_session(&logged_in())
            .expect("merge");
        assert_eq!(payload.get("_uuid"), Some("uuid-1"));
        assert_eq!(payload.get("_uid"), Some("42"));
        assert_eq!(payload.get("_csrftoken"), Some("tok"));
        assert_eq!(payload.get("user_id"), Some("7"));
        assert_eq!(payload.len(), 4);
    }

    #[test]
    fn session_merge_requires_login() {
        let err = Payload::new()
            .with_session(&Session::anonymous())
            .expect_err("anonymous");
        assert!(err.is_fatal());
    }

    #[test]
    fn empty_keys_are_rejected_before_signing() {
        let payload = Payload::new().field(" ", "x");
        assert!(matches!(
            payload.sign(&Signer::default()),
            Err(IgError::InvalidPayload(_))
        ));
    }

    #[test]
    fn signed_payload_verifies() {
        let signer = Signer::default();
        let payload = Payload::new().field("comment_text", "nice / shot");
        let signed = payload.sign(&signer).expect("sign");
        assert_eq!(
            signer.verify(signed.as_str()).expect("verify"),
            payload.to_json().expect("json")
        );
    }

    #[test]
    fn form_encoding() {
        let payload = Payload::new()
            .field("text", "hi there")
            .field("recipient_users", "[[1,2]]")
            .field_opt("thread_ids", None::<String>);
        assert_eq!(
            payload.to_form().expect("form"),
            "recipient_users=%5B%5B1%2C2%5D%5D&text=hi+there"
        );
    }
}
