//! Client handle: owns the session, the HTTP client and the collaborators.

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::delay::{Delay, TokioDelay};
use crate::error::{IgError, Result};
use crate::paginate::Paginator;
use crate::payload::Payload;
use crate::session::{AuthState, Credentials, Session};
use crate::signer::{self, credential_seed, generate_uuid};
use crate::transport::RequestBody;
use crate::types::LoginResponse;
use reqwest::Client;
use reqwest::header::HeaderValue;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Private API client for a single account.
///
/// Every network method takes `&mut self`: the session's CSRF token is
/// rewritten after each response, so requests on one client are strictly
/// sequential. Use one client per account.
#[derive(Debug)]
pub struct IgClient {
    pub(crate) config: ClientConfig,
    pub(crate) http: Client,
    pub(crate) user_agent: HeaderValue,
    pub(crate) session: Session,
    pub(crate) delay: Arc<dyn Delay>,
    credential_store: Option<Arc<dyn CredentialStore>>,
}

impl IgClient {
    /// Client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| IgError::InvalidPayload(format!("user agent: {e}")))?;
        let http = build_http(&config)?;
        Ok(Self {
            config,
            http,
            user_agent,
            session: Session::anonymous(),
            delay: Arc::new(TokioDelay),
            credential_store: None,
        })
    }

    /// Replace the sleeper used for backoff and throttling.
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    /// Attach the store consulted by [`IgClient::login_from_store`].
    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credential_store = Some(store);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Pagination driver sharing this client's delay and throttle settings.
    pub fn paginator(&self) -> Paginator {
        Paginator::new(self.delay.clone(), self.config.throttle.clone())
    }

    // ---------- Login / logout ----------

    /// Log in. A no-op when already authenticated unless `force` is set.
    pub async fn login(&mut self, credentials: Credentials, force: bool) -> Result<()> {
        if self.session.is_authenticated() && !force {
            debug!("already logged in");
            return Ok(());
        }
        self.attempt_login(credentials).await
    }

    /// Log in with credentials from the attached store.
    ///
    /// When the server rejects them the stored credentials are erased so a
    /// bad password is not silently retried. Retryable failures (network,
    /// rate limit) leave the store alone.
    pub async fn login_from_store(&mut self, force: bool) -> Result<()> {
        if self.session.is_authenticated() && !force {
            debug!("already logged in");
            return Ok(());
        }
        let store = self
            .credential_store
            .clone()
            .ok_or_else(|| IgError::Credentials("no credential store attached".to_string()))?;
        let credentials = store.load().await?;

        let result = self.attempt_login(credentials).await;
        if let Err(err) = &result
            && !err.is_retryable()
        {
            warn!("login rejected, erasing stored credentials");
            if let Err(erase_err) = store.erase().await {
                warn!(error = %erase_err, "failed to erase stored credentials");
            }
        }
        result
    }

    async fn attempt_login(&mut self, credentials: Credentials) -> Result<()> {
        let seed = credential_seed(
            &credentials.username,
            credentials.password.expose_secret(),
        );
        let device_id = signer::device_id(&seed);
        let username = credentials.username.clone();

        // Fresh cookie jar per attempt.
        self.http = build_http(&self.config)?;
        self.session
            .begin_login(credentials, device_id, generate_uuid(true));

        let outcome = match self.handshake().await {
            Ok(user_id) => self.session.complete_login(user_id),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(()) => {
                info!(username = %username, "login success");
                Ok(())
            }
            Err(err) => {
                self.session.reset();
                warn!(username = %username, error = %err, "login failed");
                Err(err)
            }
        }
    }

    /// fetch_headers for a CSRF cookie, then the signed login call.
    async fn handshake(&mut self) -> Result<String> {
        debug_assert_eq!(self.session.state(), AuthState::Authenticating);

        let endpoint = format!(
            "si/fetch_headers/?challenge_type=signup&guid={}",
            generate_uuid(false)
        );
        self.send_request(&endpoint, None, false).await?;

        let body = {
            let session = &self.session;
            let csrf = session
                .csrf_token()
                .ok_or_else(|| IgError::malformed("fetch_headers returned no csrftoken cookie"))?;
            let credentials = session
                .credentials()
                .ok_or_else(|| IgError::Credentials("login attempt has no credentials".into()))?;
            Payload::new()
                .field("phone_id", generate_uuid(true))
                .field("_csrftoken", csrf)
                .field("username", credentials.username.as_str())
                .field("guid", session.install_uuid().unwrap_or_default())
                .field("device_id", session.device_id().unwrap_or_default())
                .field("password", credentials.password.expose_secret())
                .field("login_attempt_count", "0")
                .sign(&self.config.signer)?
        };

        let response = self
            .send_request("accounts/login/", Some(body.into()), false)
            .await?;
        let login: LoginResponse = serde_json::from_value(response)
            .map_err(|e| IgError::malformed(format!("login response: {e}")))?;
        Ok(login.logged_in_user.pk)
    }

    /// Log out. Idempotent when already anonymous.
    pub async fn logout(&mut self) -> Result<()> {
        if !self.session.is_authenticated() {
            return Ok(());
        }
        self.post_signed("accounts/logout/", Payload::new()).await?;
        self.session.reset();
        info!("logged out");
        Ok(())
    }

    // ---------- Request helpers for endpoint wrappers ----------

    pub(crate) fn require_auth(&self, endpoint: &str) -> Result<()> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(IgError::not_authenticated(endpoint))
        }
    }

    pub(crate) async fn get(&mut self, endpoint: &str) -> Result<Value> {
        self.send_request(endpoint, None, true).await
    }

    /// Merge session identifiers, sign, POST.
    pub(crate) async fn post_signed(&mut self, endpoint: &str, payload: Payload) -> Result<Value> {
        self.require_auth(endpoint)?;
        let body = payload
            .with_session(&self.session)?
            .sign(&self.config.signer)?;
        self.send_request(endpoint, Some(body.into()), true).await
    }

    /// POST an unsigned, pre-encoded form body.
    pub(crate) async fn post_form(&mut self, endpoint: &str, body: String) -> Result<Value> {
        self.send_request(endpoint, Some(RequestBody::Form(body)), true)
            .await
    }
}

fn build_http(config: &ClientConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .cookie_store(true)
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout);
    // Only the configured proxy is used; system proxy variables are ignored.
    builder = match config.proxy.as_deref() {
        Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy).map_err(IgError::Transport)?),
        None => builder.no_proxy(),
    };
    builder.build().map_err(IgError::Transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_with_defaults() {
        let client = IgClient::new().expect("client");
        assert!(!client.is_authenticated());
        assert_eq!(client.session().request_count(), 0);
    }

    #[test]
    fn client_builds_with_proxy() {
        let config = ClientConfig::new().with_proxy("127.0.0.1:3128");
        let _ = IgClient::with_config(config).expect("client with proxy");
    }

    #[test]
    fn invalid_user_agent_is_rejected() {
        let config = ClientConfig::new().with_user_agent("bad\nagent");
        assert!(matches!(
            IgClient::with_config(config),
            Err(IgError::InvalidPayload(_))
        ));
    }

    #[tokio::test]
    async fn authenticated_calls_fail_fast_when_anonymous() {
        let mut client = IgClient::with_config(
            ClientConfig::new().with_base_url("http://127.0.0.1:9/"),
        )
        .expect("client");
        let err = client
            .send_request("feed/timeline/", None, true)
            .await
            .expect_err("anonymous");
        assert!(matches!(err, IgError::NotAuthenticated { ref endpoint } if endpoint == "feed/timeline/"));
        // Nothing went out.
        assert_eq!(client.session().request_count(), 0);

        let err = client
            .post_signed("media/1/like/", Payload::new())
            .await
            .expect_err("anonymous");
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn logout_when_anonymous_is_a_no_op() {
        let mut client = IgClient::new().expect("client");
        client.logout().await.expect("logout");
        assert_eq!(client.session().request_count(), 0);
    }

    #[tokio::test]
    async fn login_from_store_requires_a_store() {
        let mut client = IgClient::new().expect("client");
        assert!(matches!(
            client.login_from_store(false).await,
            Err(IgError::Credentials(_))
        ));
    }
}
