//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use igapi::{
    ClientConfig, CredentialStore, Credentials, Delay, IgClient, IgError, Result,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const USER_ID: &str = "12345";
pub const CSRF: &str = "abc123";

/// Records requested sleeps instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// In-memory credential store that remembers whether it was erased.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<Option<Credentials>>,
    erased: Mutex<bool>,
}

impl MemoryCredentialStore {
    pub fn with(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(Some(credentials)),
            erased: Mutex::new(false),
        }
    }

    pub fn was_erased(&self) -> bool {
        *self.erased.lock().unwrap()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Credentials> {
        self.credentials
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| IgError::Credentials("empty store".to_string()))
    }

    async fn save(&self, credentials: &Credentials) -> Result<()> {
        *self.credentials.lock().unwrap() = Some(credentials.clone());
        Ok(())
    }

    async fn erase(&self) -> Result<()> {
        *self.credentials.lock().unwrap() = None;
        *self.erased.lock().unwrap() = true;
        Ok(())
    }
}

pub fn alice() -> Credentials {
    Credentials::new("alice", "hunter2")
}

pub fn api_path(endpoint: &str) -> String {
    format!("/api/v1/{endpoint}")
}

pub fn client_for(server: &MockServer, delay: Arc<RecordingDelay>) -> IgClient {
    telemetry::init_test();
    let config = ClientConfig::new().with_base_url(format!("{}/api/v1/", server.uri()));
    IgClient::with_config(config)
        .expect("client")
        .with_delay(delay)
}

/// fetch_headers handing out the CSRF cookie.
pub async fn mount_fetch_headers(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(api_path("si/fetch_headers/")))
        .and(query_param("challenge_type", "signup"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("csrftoken={CSRF}; Path=/").as_str())
                .set_body_json(json!({"status": "ok"})),
        )
        .mount(server)
        .await;
}

pub async fn mount_login(server: &MockServer) {
    mount_fetch_headers(server).await;
    Mock::given(method("POST"))
        .and(path(api_path("accounts/login/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "logged_in_user": {"pk": 12345, "username": "alice"},
            "status": "ok"
        })))
        .mount(server)
        .await;
}

/// A client already logged in against `server`.
pub async fn logged_in_client(server: &MockServer) -> (IgClient, Arc<RecordingDelay>) {
    mount_login(server).await;
    let delay = Arc::new(RecordingDelay::default());
    let mut client = client_for(server, delay.clone());
    client.login(alice(), false).await.expect("login");
    (client, delay)
}

/// `n` follower entries with ids starting at `first`.
pub fn users_page(first: u64, n: u64, next: Option<&str>) -> Value {
    let users: Vec<Value> = (first..first + n)
        .map(|pk| json!({"pk": pk, "username": format!("user{pk}")}))
        .collect();
    let mut page = json!({"users": users, "big_list": next.is_some(), "status": "ok"});
    if let Some(next) = next {
        page["next_max_id"] = json!(next);
    }
    page
}

/// Requests the server saw for `endpoint`.
pub async fn requests_to(server: &MockServer, endpoint: &str) -> Vec<Request> {
    let wanted = api_path(endpoint);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == wanted)
        .collect()
}

/// Verified JSON payload of a signed request body.
pub fn signed_payload(request: &Request) -> Value {
    let body = String::from_utf8(request.body.clone()).expect("utf-8 body");
    let payload = igapi::Signer::default().verify(&body).expect("valid signature");
    serde_json::from_str(&payload).expect("payload json")
}
