//! Whole-listing scans built on the paginator.

use super::feed::{hashtag_feed_path, liked_media_path, user_feed_path};
use super::friendships::{followers_path, followings_path};
use crate::client::IgClient;
use crate::error::{IgError, Result};
use crate::paginate::{PageCursor, PageShape, PaginateOptions, PaginationResult};
use crate::session::Session;
use crate::types::{MediaItem, UserInfo, UserSummary};
use tracing::{info, warn};

/// Default number of hashtag posts collected when no amount is given.
pub const DEFAULT_HASHTAG_AMOUNT: usize = 100;

/// Lists larger than this get a warning before the scan starts.
const BIG_LIST_WARNING: usize = 200_000;

/// Client-side statuses are how private, blocked or deleted users look.
fn is_restricted(err: &IgError) -> bool {
    matches!(
        err,
        IgError::BadRequest { .. } | IgError::Server { status: 400..=499, .. }
    )
}

fn inaccessible<T>() -> PaginationResult<T> {
    PaginationResult {
        inaccessible: true,
        ..PaginationResult::default()
    }
}

#[derive(Clone, Copy)]
enum Relation {
    Followers,
    Followings,
}

impl Relation {
    fn count(self, info: &UserInfo) -> Option<u64> {
        match self {
            Relation::Followers => info.follower_count,
            Relation::Followings => info.following_count,
        }
    }

    fn path(self, user_id: &str, rank_token: &str, cursor: &PageCursor) -> String {
        match self {
            Relation::Followers => followers_path(user_id, rank_token, cursor),
            Relation::Followings => followings_path(user_id, rank_token, cursor),
        }
    }
}

impl IgClient {
    /// Every follower of `user_id`, up to `amount` (default: the follower count).
    pub async fn total_followers(
        &mut self,
        user_id: &str,
        amount: Option<usize>,
    ) -> Result<PaginationResult<UserSummary>> {
        self.total_relation(Relation::Followers, user_id, amount)
            .await
    }

    /// Every account `user_id` follows, up to `amount` (default: the following count).
    pub async fn total_followings(
        &mut self,
        user_id: &str,
        amount: Option<usize>,
    ) -> Result<PaginationResult<UserSummary>> {
        self.total_relation(Relation::Followings, user_id, amount)
            .await
    }

    pub async fn total_self_followers(&mut self) -> Result<PaginationResult<UserSummary>> {
        let user_id = self.session.user_id()?.to_string();
        self.total_followers(&user_id, None).await
    }

    pub async fn total_self_followings(&mut self) -> Result<PaginationResult<UserSummary>> {
        let user_id = self.session.user_id()?.to_string();
        self.total_followings(&user_id, None).await
    }

    async fn total_relation(
        &mut self,
        relation: Relation,
        user_id: &str,
        amount: Option<usize>,
    ) -> Result<PaginationResult<UserSummary>> {
        let info = match self.user_info(user_id).await {
            Ok(Some(info)) => info,
            Ok(None) => {
                info!(user_id, "user info unavailable, nothing to scan");
                return Ok(inaccessible());
            }
            Err(err) if is_restricted(&err) => {
                info!(user_id, error = %err, "user info refused, nothing to scan");
                return Ok(inaccessible());
            }
            Err(err) => return Err(err),
        };

        let cap = amount
            .filter(|&n| n > 0)
            .or_else(|| relation.count(&info).map(|n| n as usize));
        if let Some(total) = cap
            && total > BIG_LIST_WARNING
        {
            warn!(user_id, total, "very large list, this scan will take a while");
        }

        let options = PaginateOptions {
            cap,
            max_pages: None,
        };
        let user_id = user_id.to_string();
        self.scan(
            PageShape::USERS,
            options,
            move |session: &Session, cursor: &PageCursor| {
                Ok(relation.path(&user_id, session.rank_token()?, cursor))
            },
        )
        .await
    }

    /// Every post of `user_id`. An inaccessible (private) feed ends the scan
    /// with whatever was collected and `inaccessible` set.
    pub async fn total_user_feed(
        &mut self,
        user_id: &str,
        min_timestamp: Option<i64>,
    ) -> Result<PaginationResult<MediaItem>> {
        let user_id = user_id.to_string();
        self.scan(
            PageShape::FEED,
            PaginateOptions::unbounded(),
            move |session: &Session, cursor: &PageCursor| {
                Ok(user_feed_path(
                    &user_id,
                    session.rank_token()?,
                    cursor,
                    min_timestamp,
                ))
            },
        )
        .await
    }

    pub async fn total_self_user_feed(
        &mut self,
        min_timestamp: Option<i64>,
    ) -> Result<PaginationResult<MediaItem>> {
        let user_id = self.session.user_id()?.to_string();
        self.total_user_feed(&user_id, min_timestamp).await
    }

    /// Up to `amount` posts for a hashtag ([`DEFAULT_HASHTAG_AMOUNT`] when `None`).
    pub async fn total_hashtag_feed(
        &mut self,
        tag: &str,
        amount: Option<usize>,
    ) -> Result<PaginationResult<MediaItem>> {
        let tag = tag.to_string();
        let amount = amount.unwrap_or(DEFAULT_HASHTAG_AMOUNT);
        self.scan(
            PageShape::TAG_FEED,
            PaginateOptions::capped(amount),
            move |session: &Session, cursor: &PageCursor| {
                Ok(hashtag_feed_path(&tag, session.rank_token()?, cursor))
            },
        )
        .await
    }

    /// Liked posts, reading at most `pages` pages.
    pub async fn total_liked_media(&mut self, pages: usize) -> Result<PaginationResult<MediaItem>> {
        self.require_auth("feed/liked/")?;
        self.scan(
            PageShape::FEED,
            PaginateOptions::pages(pages),
            |_: &Session, cursor: &PageCursor| Ok(liked_media_path(cursor)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn client_errors_count_as_restricted() {
        assert!(is_restricted(&IgError::BadRequest {
            message: None,
            error_type: None,
        }));
        assert!(is_restricted(&IgError::Server {
            status: 404,
            body: String::new(),
        }));
        assert!(!is_restricted(&IgError::Server {
            status: 503,
            body: String::new(),
        }));
        assert!(!is_restricted(&IgError::RateLimited {
            waited: Duration::from_secs(300),
        }));
        assert!(!is_restricted(&IgError::not_authenticated("users/1/info/")));
        assert!(!is_restricted(&IgError::Timeout));
    }
}
