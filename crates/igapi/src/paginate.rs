//! Cursor pagination.
//!
//! A scan starts from an empty cursor and keeps requesting pages until the
//! server runs dry, a cap is reached, or a page comes back without its
//! root key. The last case is how private or restricted resources look, so
//! it ends the scan quietly with whatever was collected.

use crate::config::ThrottleConfig;
use crate::delay::Delay;
use crate::error::{IgError, Result};
use async_trait::async_trait;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Opaque continuation token (`next_max_id`). Empty means "from the start".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn start() -> Self {
        Self::default()
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn is_start(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a listing keeps its items, its "more" flag and its cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageShape {
    pub items_key: &'static str,
    /// `None`: the listing has no flag; continue while a cursor is given.
    pub more_available_key: Option<&'static str>,
    pub cursor_key: &'static str,
}

impl PageShape {
    /// Follower / following lists.
    pub const USERS: PageShape = PageShape {
        items_key: "users",
        more_available_key: Some("big_list"),
        cursor_key: "next_max_id",
    };

    /// User, location and liked feeds.
    pub const FEED: PageShape = PageShape {
        items_key: "items",
        more_available_key: Some("more_available"),
        cursor_key: "next_max_id",
    };

    /// Hashtag feeds.
    pub const TAG_FEED: PageShape = PageShape {
        items_key: "items",
        more_available_key: None,
        cursor_key: "next_max_id",
    };

    /// Decode one page; `None` when the root key is missing or unreadable.
    pub fn extract<T: DeserializeOwned>(&self, body: &Value) -> Option<Page<T>> {
        let raw_items = body.get(self.items_key)?.as_array()?;
        let mut items = Vec::with_capacity(raw_items.len());
        for raw in raw_items {
            match T::deserialize(raw) {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(key = self.items_key, error = %e, "undecodable item in page");
                    return None;
                }
            }
        }

        let more_available = match self.more_available_key {
            Some(key) => body.get(key).and_then(Value::as_bool).unwrap_or(false),
            None => true,
        };
        let next_cursor = match body.get(self.cursor_key) {
            Some(Value::String(s)) if !s.is_empty() => Some(PageCursor::new(s.clone())),
            Some(Value::Number(n)) => Some(PageCursor::new(n.to_string())),
            _ => None,
        };

        Some(Page {
            items,
            more_available,
            next_cursor,
        })
    }
}

/// One decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub more_available: bool,
    pub next_cursor: Option<PageCursor>,
}

/// Produces raw page bodies for a cursor.
#[async_trait]
pub trait PageSource: Send {
    async fn fetch_page(&mut self, cursor: &PageCursor) -> Result<Value>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginateOptions {
    /// Never return more than this many items.
    pub cap: Option<usize>,
    /// Never request more than this many pages.
    pub max_pages: Option<usize>,
}

impl PaginateOptions {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn capped(cap: usize) -> Self {
        Self {
            cap: Some(cap),
            max_pages: None,
        }
    }

    pub fn pages(max_pages: usize) -> Self {
        Self {
            cap: None,
            max_pages: Some(max_pages),
        }
    }
}

/// Outcome of a scan.
#[derive(Debug)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    /// The server signalled the end of the listing.
    pub exhausted: bool,
    /// Stopped because the cap was reached.
    pub truncated_by_cap: bool,
    /// A page lacked its root key (private or restricted resource).
    pub inaccessible: bool,
    /// A request failed mid-scan; `items` holds the pages before it.
    pub interrupted: Option<IgError>,
    /// Where to resume when the scan stopped early.
    pub next_cursor: Option<PageCursor>,
    /// Pages fetched.
    pub pages: usize,
}

impl<T> Default for PaginationResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            exhausted: false,
            truncated_by_cap: false,
            inaccessible: false,
            interrupted: None,
            next_cursor: None,
            pages: 0,
        }
    }
}

impl<T> PaginationResult<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Drives a [`PageSource`] to completion.
#[derive(Debug, Clone)]
pub struct Paginator {
    delay: Arc<dyn Delay>,
    throttle: ThrottleConfig,
}

impl Paginator {
    pub fn new(delay: Arc<dyn Delay>, throttle: ThrottleConfig) -> Self {
        Self { delay, throttle }
    }

    pub async fn run<T, S>(
        &self,
        source: &mut S,
        shape: &PageShape,
        options: PaginateOptions,
    ) -> Result<PaginationResult<T>>
    where
        T: DeserializeOwned + Send,
        S: PageSource + ?Sized,
    {
        let mut result = PaginationResult::default();
        let mut cursor = PageCursor::start();
        let mut since_pause = 0usize;

        if options.cap == Some(0) {
            result.truncated_by_cap = true;
            return Ok(result);
        }

        loop {
            if let Some(max) = options.max_pages
                && result.pages >= max
            {
                result.next_cursor = Some(cursor);
                return Ok(result);
            }

            let body = match source.fetch_page(&cursor).await {
                Ok(body) => body,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(
                        pages = result.pages,
                        collected = result.items.len(),
                        error = %err,
                        "scan interrupted"
                    );
                    result.next_cursor = Some(cursor);
                    result.interrupted = Some(err);
                    return Ok(result);
                }
            };
            result.pages += 1;

            let Some(page) = shape.extract::<T>(&body) else {
                debug!(key = shape.items_key, "page without root key, stopping");
                result.inaccessible = true;
                return Ok(result);
            };

            let received = page.items.len();
            result.items.extend(page.items);
            since_pause += received;
            debug!(
                page = result.pages,
                received,
                collected = result.items.len(),
                "page received"
            );

            if received == 0 {
                result.exhausted = true;
                return Ok(result);
            }
            if let Some(cap) = options.cap
                && result.items.len() >= cap
            {
                result.items.truncate(cap);
                result.truncated_by_cap = true;
                return Ok(result);
            }
            if !page.more_available {
                result.exhausted = true;
                return Ok(result);
            }
            let Some(next) = page.next_cursor else {
                result.exhausted = true;
                return Ok(result);
            };
            cursor = next;

            while self.throttle.every > 0 && since_pause >= self.throttle.every {
                let pause = self.pause_duration();
                info!(
                    collected = result.items.len(),
                    pause_secs = pause.as_secs(),
                    "large scan, pausing to stay under the rate limit"
                );
                self.delay.sleep(pause).await;
                since_pause -= self.throttle.every;
            }
        }
    }

    fn pause_duration(&self) -> Duration {
        let lo = self.throttle.min.as_millis() as u64;
        let hi = (self.throttle.max.as_millis() as u64).max(lo);
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }
}
