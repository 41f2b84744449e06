//! Static API constants and client configuration.

use crate::signer::Signer;
use std::time::Duration;

/// Default private API base URL. Endpoints are appended verbatim.
pub const DEFAULT_API_URL: &str = "https://i.instagram.com/api/v1/";

/// Pinned Android app user agent.
pub const USER_AGENT: &str = "Instagram 10.26.0 Android (18/4.3; 320dpi; 720x1280; Xiaomi; HM 1SW; armani; qcom; en_US)";

/// Application signing key the server expects request bodies to be keyed with.
pub const SIG_KEY: &str = "4f8732eb9ba7d1c8e8897a75d6474d4eb3f5279137431b2aafb71fafe2abe178";

/// Signature scheme version sent alongside every signed body.
pub const SIG_KEY_VERSION: &str = "4";

/// Experiment list posted by `sync_features` at session setup.
pub const EXPERIMENTS: &str = "ig_promote_reach_objective_fix_universe,ig_android_universe_video_production,\
ig_search_client_h1_2017_holdout,ig_android_live_follow_from_comments_universe,\
ig_android_carousel_non_square_creation,ig_android_live_analytics,\
ig_android_follow_all_dialog_confirmation_copy,ig_android_stories_server_coverframe,\
ig_android_video_captions_universe,ig_android_offline_location_feed,\
ig_android_direct_inbox_retry_seen_state,ig_android_direct_send_auto_retry,\
ig_android_feed_seen_state_with_view_info,ig_android_profile_contextual_feed,\
ig_android_hashtag_following,ig_android_insta_video_consumption_titles,\
ig_android_stories_gallery_improvements,ig_android_direct_mutually_exclusive_experiment_universe";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const RATE_LIMIT_BACKOFF_SECS: u64 = 5 * 60;

/// Self-throttle applied during very large pagination scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Sleep after this many accumulated items.
    pub every: usize,
    /// Lower bound of the randomized pause.
    pub min: Duration,
    /// Upper bound of the randomized pause (inclusive).
    pub max: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            every: 20_000,
            min: Duration::from_secs(120),
            max: Duration::from_secs(180),
        }
    }
}

/// Configuration for [`crate::IgClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub signer: Signer,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub proxy: Option<String>,
    pub rate_limit_backoff: Duration,
    pub throttle: ThrottleConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            signer: Signer::default(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            proxy: None,
            rate_limit_backoff: Duration::from_secs(RATE_LIMIT_BACKOFF_SECS),
            throttle: ThrottleConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, overridden by `IGAPI_API_URL` and `IGAPI_PROXY` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("IGAPI_API_URL").filter(|s| !s.is_empty()) {
            config = config.with_base_url(url);
        }
        if let Some(proxy) = lookup("IGAPI_PROXY").filter(|s| !s.is_empty()) {
            config = config.with_proxy(proxy);
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.base_url = url;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = signer;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    /// Route all traffic through `proxy`; `host:port` is taken as `http://host:port`.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        let proxy = proxy.into();
        self.proxy = Some(if proxy.contains("://") {
            proxy
        } else {
            format!("http://{proxy}")
        });
        self
    }

    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    /// Full URL for an endpoint path such as `feed/timeline/`.
    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}
