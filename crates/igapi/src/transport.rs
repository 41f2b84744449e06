//! HTTP transport: headers, dispatch and response classification.

use crate::client::IgClient;
use crate::error::{IgError, Result};
use crate::signer::SignedBody;
use crate::types::ErrorEnvelope;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, error, info, warn};

const CSRF_COOKIE: &str = "csrftoken";
const BODY_SNIPPET_CHARS: usize = 400;

/// Body of a POST request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Output of [`crate::Signer::sign`].
    Signed(SignedBody),
    /// Pre-encoded form body sent as-is (unsigned endpoints).
    Form(String),
}

impl RequestBody {
    pub fn as_str(&self) -> &str {
        match self {
            RequestBody::Signed(body) => body.as_str(),
            RequestBody::Form(body) => body,
        }
    }

    fn into_string(self) -> String {
        match self {
            RequestBody::Signed(body) => body.into_string(),
            RequestBody::Form(body) => body,
        }
    }
}

impl From<SignedBody> for RequestBody {
    fn from(body: SignedBody) -> Self {
        RequestBody::Signed(body)
    }
}

/// The fixed header set sent with every request.
pub(crate) fn request_headers(user_agent: &HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
    );
    headers.insert(
        HeaderName::from_static("cookie2"),
        HeaderValue::from_static("$Version=1"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));
    headers.insert(header::USER_AGENT, user_agent.clone());
    headers
}

/// Error for a non-200, non-429 response.
pub(crate) fn status_error(status: u16, body: &str) -> IgError {
    if status == 400 {
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
        if let Some(message) = envelope.message.as_deref() {
            info!(message, "API error message");
        }
        if let Some(error_type) = envelope.error_type.as_deref() {
            info!(error_type, "API error type");
        }
        return IgError::BadRequest {
            message: envelope.message,
            error_type: envelope.error_type,
        };
    }
    IgError::Server {
        status,
        body: body.chars().take(BODY_SNIPPET_CHARS).collect(),
    }
}

fn transport_error(endpoint: &str, err: reqwest::Error) -> IgError {
    warn!(endpoint, error = %err, "request failed");
    if err.is_timeout() {
        IgError::Timeout
    } else {
        IgError::Transport(err)
    }
}

impl IgClient {
    /// Send one request. GET without a body, POST with it.
    ///
    /// Authenticated calls made before login fail with
    /// [`IgError::NotAuthenticated`] without touching the network. A 429
    /// parks the caller for the configured backoff and then fails; nothing
    /// is retried here.
    pub async fn send_request(
        &mut self,
        endpoint: &str,
        body: Option<RequestBody>,
        requires_auth: bool,
    ) -> Result<Value> {
        if requires_auth && !self.session.is_authenticated() {
            error!(endpoint, "not logged in");
            return Err(IgError::not_authenticated(endpoint));
        }

        let request_count = self.session.record_request();
        let url = self.config.url(endpoint);
        let builder = match body {
            None => self.http.get(&url),
            Some(body) => self.http.post(&url).body(body.into_string()),
        }
        .headers(request_headers(&self.user_agent));

        debug!(endpoint, request_count, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        let status = response.status();
        let csrf = response
            .cookies()
            .find(|c| c.name() == CSRF_COOKIE)
            .map(|c| c.value().to_string());
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        if status == StatusCode::OK {
            if let Some(token) = csrf
                && self.session.set_csrf_token(token)
            {
                debug!(endpoint, "csrf token refreshed");
            }
            return serde_json::from_str(&text).map_err(|e| {
                let snippet: String = text.chars().take(BODY_SNIPPET_CHARS).collect();
                IgError::malformed(format!("{endpoint}: {e} (body: {snippet})"))
            });
        }

        error!(endpoint, status = status.as_u16(), "request returned error status");
        if status == StatusCode::TOO_MANY_REQUESTS {
            let waited = self.config.rate_limit_backoff;
            warn!(
                endpoint,
                backoff_secs = waited.as_secs(),
                "too many requests, backing off"
            );
            self.delay.sleep(waited).await;
            return Err(IgError::RateLimited { waited });
        }
        Err(status_error(status.as_u16(), &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_fixed() {
        let ua = HeaderValue::from_static("TestAgent/1.0");
        let headers = request_headers(&ua);
        assert_eq!(headers.get(header::USER_AGENT).unwrap(), "TestAgent/1.0");
        assert_eq!(headers.get(header::CONNECTION).unwrap(), "close");
        assert_eq!(headers.get("cookie2").unwrap(), "$Version=1");
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded; charset=UTF-8"
        );
        assert_eq!(headers.len(), 6);
    }

    #[test]
    fn bad_request_with_envelope() {
        let err = status_error(
            400,
            r#"{"message":"The password you entered is incorrect.","error_type":"bad_password","status":"fail"}"#,
        );
        match err {
            IgError::BadRequest {
                message,
                error_type,
            } => {
                assert_eq!(
                    message.as_deref(),
                    Some("The password you entered is incorrect.")
                );
                assert_eq!(error_type.as_deref(), Some("bad_password"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_request_without_envelope_is_generic() {
        match status_error(400, "<html>nope</html>") {
            IgError::BadRequest {
                message: None,
                error_type: None,
            } => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn other_statuses_carry_code_and_snippet() {
        let long = "x".repeat(1000);
        match status_error(503, &long) {
            IgError::Server { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body.len(), BODY_SNIPPET_CHARS);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn request_body_text() {
        let form = RequestBody::Form("a=b".to_string());
        assert_eq!(form.as_str(), "a=b");
        let signed: RequestBody = crate::Signer::default().sign("{}").into();
        assert!(signed.as_str().starts_with("ig_sig_key_version=4&signed_body="));
    }
}
