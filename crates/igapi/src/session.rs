//! Session state and the login state machine.
//!
//! A [`Session`] is owned by exactly one client. It moves
//! `Anonymous -> Authenticating -> Authenticated` on login and back to
//! `Anonymous` on logout or a failed attempt. Identifiers derived at login
//! (`rank_token` in particular) are only readable while authenticated.

use crate::error::{IgError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroize;

/// Password wrapper: redacted in `Debug`/`Display`, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// The clear-text password. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl Drop for Password {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// The credential file is the one place the clear text is written out.
impl Serialize for Password {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Password {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Password)
    }
}

/// Username and password for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: Password,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<Password>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// Per-client session: credentials, generated identifiers and auth tokens.
#[derive(Debug, Clone)]
pub struct Session {
    state: AuthState,
    credentials: Option<Credentials>,
    device_id: Option<String>,
    install_uuid: Option<String>,
    user_id: Option<String>,
    rank_token: Option<String>,
    csrf_token: Option<String>,
    request_count: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            state: AuthState::Anonymous,
            credentials: None,
            device_id: None,
            install_uuid: None,
            user_id: None,
            rank_token: None,
            csrf_token: None,
            request_count: 0,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    /// Start a login attempt. Overwrites everything from a previous cycle.
    pub(crate) fn begin_login(
        &mut self,
        credentials: Credentials,
        device_id: String,
        install_uuid: String,
    ) {
        self.credentials = Some(credentials);
        self.device_id = Some(device_id);
        self.install_uuid = Some(install_uuid);
        self.user_id = None;
        self.rank_token = None;
        self.csrf_token = None;
        self.state = AuthState::Authenticating;
    }

    /// Finish a login attempt; `rank_token` is derived here and never again.
    pub(crate) fn complete_login(&mut self, user_id: String) -> Result<()> {
        if self.state != AuthState::Authenticating {
            return Err(IgError::malformed("login completed outside of an attempt"));
        }
        let install_uuid = self
            .install_uuid
            .as_deref()
            .ok_or_else(|| IgError::malformed("login attempt has no install uuid"))?;
        self.rank_token = Some(format!("{user_id}_{install_uuid}"));
        self.user_id = Some(user_id);
        self.state = AuthState::Authenticated;
        Ok(())
    }

    /// Back to anonymous. The request counter is preserved.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            request_count: self.request_count,
            ..Self::anonymous()
        };
    }

    pub(crate) fn record_request(&mut self) -> u64 {
        self.request_count += 1;
        self.request_count
    }

    pub(crate) fn set_csrf_token(&mut self, token: String) -> bool {
        if self.csrf_token.as_deref() == Some(token.as_str()) {
            return false;
        }
        self.csrf_token = Some(token);
        true
    }

    pub(crate) fn replace_password(&mut self, password: Password) {
        if let Some(credentials) = self.credentials.as_mut() {
            credentials.password = password;
        }
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    pub(crate) fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn install_uuid(&self) -> Option<&str> {
        self.install_uuid.as_deref()
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Logged-in user id; fails fast when not authenticated.
    pub fn user_id(&self) -> Result<&str> {
        self.authenticated_field(self.user_id.as_deref(), "user_id")
    }

    /// `<user_id>_<install_uuid>`; fails fast when not authenticated.
    pub fn rank_token(&self) -> Result<&str> {
        self.authenticated_field(self.rank_token.as_deref(), "rank_token")
    }

    fn authenticated_field<'a>(&self, value: Option<&'a str>, name: &str) -> Result<&'a str> {
        match (self.state, value) {
            (AuthState::Authenticated, Some(v)) => Ok(v),
            _ => Err(IgError::not_authenticated(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticating() -> Session {
        let mut session = Session::anonymous();
        session.begin_login(
            Credentials::new("alice", "hunter2"),
            "android-0123456789abcdef".to_string(),
            "0f8fad5b-d9cb-469f-a165-70867728950e".to_string(),
        );
        session
    }

    #[test]
    fn password_is_redacted() {
        let creds = Credentials::new("alice", "hunter2");
        let dbg = format!("{creds:?}");
        assert!(dbg.contains("alice"));
        assert!(!dbg.contains("hunter2"));
        assert_eq!(creds.password.to_string(), "[REDACTED]");
        assert_eq!(creds.password.expose_secret(), "hunter2");
    }

    #[test]
    fn credentials_round_trip_through_json() {
        let creds = Credentials::new("alice", "hunter2");
        let json = serde_json::to_string(&creds).expect("serialize");
        assert_eq!(json, r#"{"username":"alice","password":"hunter2"}"#);
        let back: Credentials = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, creds);
    }

    #[test]
    fn anonymous_session_refuses_tokens() {
        let session = Session::anonymous();
        assert_eq!(session.state(), AuthState::Anonymous);
        assert!(matches!(
            session.rank_token(),
            Err(IgError::NotAuthenticated { .. })
        ));
        assert!(session.user_id().is_err());
    }

    #[test]
    fn login_derives_rank_token_once() {
        let mut session = authenticating();
        assert_eq!(session.state(), AuthState::Authenticating);
        assert!(session.rank_token().is_err());

        session.complete_login("12345".to_string()).expect("complete");
        assert!(session.is_authenticated());
        assert_eq!(session.user_id().expect("uid"), "12345");
        assert_eq!(
            session.rank_token().expect("rank"),
            "12345_0f8fad5b-d9cb-469f-a165-70867728950e"
        );

        // A second completion is not a valid transition.
        assert!(session.complete_login("999".to_string()).is_err());
        assert_eq!(
            session.rank_token().expect("rank"),
            "12345_0f8fad5b-d9cb-469f-a165-70867728950e"
        );
    }

    #[test]
    fn reset_keeps_request_count() {
        let mut session = authenticating();
        session.record_request();
        session.record_request();
        session.complete_login("1".to_string()).expect("complete");
        session.reset();
        assert_eq!(session.state(), AuthState::Anonymous);
        assert_eq!(session.request_count(), 2);
        assert!(session.username().is_none());
        assert!(session.csrf_token().is_none());
    }

    #[test]
    fn csrf_update_reports_change() {
        let mut session = Session::anonymous();
        assert!(session.set_csrf_token("a".to_string()));
        assert!(!session.set_csrf_token("a".to_string()));
        assert!(session.set_csrf_token("b".to_string()));
        assert_eq!(session.csrf_token(), Some("b"));
    }
}
