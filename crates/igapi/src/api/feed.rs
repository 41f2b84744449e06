use super::segment;
use crate::client::IgClient;
use crate::error::Result;
use crate::paginate::PageCursor;
use serde_json::Value;

pub(crate) fn user_feed_path(
    user_id: &str,
    rank_token: &str,
    cursor: &PageCursor,
    min_timestamp: Option<i64>,
) -> String {
    let min_timestamp = min_timestamp.map(|t| t.to_string()).unwrap_or_default();
    format!(
        "feed/user/{user_id}/?max_id={cursor}&min_timestamp={min_timestamp}&rank_token={rank_token}&ranked_content=true"
    )
}

pub(crate) fn hashtag_feed_path(tag: &str, rank_token: &str, cursor: &PageCursor) -> String {
    format!(
        "feed/tag/{}/?max_id={cursor}&rank_token={rank_token}&ranked_content=true&",
        segment(tag)
    )
}

pub(crate) fn location_feed_path(location_id: &str, rank_token: &str, cursor: &PageCursor) -> String {
    format!(
        "feed/location/{location_id}/?max_id={cursor}&rank_token={rank_token}&ranked_content=true&"
    )
}

pub(crate) fn liked_media_path(cursor: &PageCursor) -> String {
    format!("feed/liked/?max_id={cursor}")
}

impl IgClient {
    /// Latest few posts of the logged-in user's timeline.
    pub async fn timeline_feed(&mut self) -> Result<Value> {
        self.get("feed/timeline/").await
    }

    /// Ranked timeline.
    pub async fn timeline(&mut self) -> Result<Value> {
        let endpoint = format!(
            "feed/timeline/?rank_token={}&ranked_content=true&",
            self.session.rank_token()?
        );
        self.get(&endpoint).await
    }

    pub async fn archive_feed(&mut self) -> Result<Value> {
        let endpoint = format!(
            "feed/only_me_feed/?rank_token={}&ranked_content=true&",
            self.session.rank_token()?
        );
        self.get(&endpoint).await
    }

    pub async fn popular_feed(&mut self) -> Result<Value> {
        let endpoint = format!(
            "feed/popular/?people_teaser_supported=1&rank_token={}&ranked_content=true&",
            self.session.rank_token()?
        );
        self.get(&endpoint).await
    }

    pub async fn explore(&mut self) -> Result<Value> {
        self.get("discover/explore/").await
    }

    pub async fn user_feed(
        &mut self,
        user_id: &str,
        cursor: &PageCursor,
        min_timestamp: Option<i64>,
    ) -> Result<Value> {
        let endpoint = user_feed_path(user_id, self.session.rank_token()?, cursor, min_timestamp);
        self.get(&endpoint).await
    }

    pub async fn self_user_feed(
        &mut self,
        cursor: &PageCursor,
        min_timestamp: Option<i64>,
    ) -> Result<Value> {
        let user_id = self.session.user_id()?.to_string();
        self.user_feed(&user_id, cursor, min_timestamp).await
    }

    pub async fn hashtag_feed(&mut self, tag: &str, cursor: &PageCursor) -> Result<Value> {
        let endpoint = hashtag_feed_path(tag, self.session.rank_token()?, cursor);
        self.get(&endpoint).await
    }

    /// First page of a hashtag feed.
    pub async fn tag_feed(&mut self, tag: &str) -> Result<Value> {
        let endpoint = format!(
            "feed/tag/{}/?rank_token={}&ranked_content=true&",
            segment(tag),
            self.session.rank_token()?
        );
        self.get(&endpoint).await
    }

    pub async fn location_feed(&mut self, location_id: &str, cursor: &PageCursor) -> Result<Value> {
        let endpoint = location_feed_path(location_id, self.session.rank_token()?, cursor);
        self.get(&endpoint).await
    }

    pub async fn liked_media(&mut self, cursor: &PageCursor) -> Result<Value> {
        self.get(&liked_media_path(cursor)).await
    }

    /// Posts `user_id` is tagged in.
    pub async fn user_tags(&mut self, user_id: &str) -> Result<Value> {
        let endpoint = format!(
            "usertags/{user_id}/feed/?rank_token={}&ranked_content=true&",
            self.session.rank_token()?
        );
        self.get(&endpoint).await
    }

    pub async fn self_user_tags(&mut self) -> Result<Value> {
        let user_id = self.session.user_id()?.to_string();
        self.user_tags(&user_id).await
    }

    pub async fn geo_media(&mut self, user_id: &str) -> Result<Value> {
        self.get(&format!("maps/user/{user_id}/")).await
    }

    pub async fn self_geo_media(&mut self) -> Result<Value> {
        let user_id = self.session.user_id()?.to_string();
        self.geo_media(&user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_feed_path_shapes() {
        assert_eq!(
            user_feed_path("9", "9_u", &PageCursor::start(), None),
            "feed/user/9/?max_id=&min_timestamp=&rank_token=9_u&ranked_content=true"
        );
        assert_eq!(
            user_feed_path("9", "9_u", &PageCursor::new("abc"), Some(1500000000)),
            "feed/user/9/?max_id=abc&min_timestamp=1500000000&rank_token=9_u&ranked_content=true"
        );
    }

    #[test]
    fn hashtag_is_escaped() {
        assert_eq!(
            hashtag_feed_path("café life", "1_u", &PageCursor::new("x")),
            "feed/tag/caf%C3%A9%20life/?max_id=x&rank_token=1_u&ranked_content=true&"
        );
    }

    #[test]
    fn liked_and_location_paths() {
        assert_eq!(liked_media_path(&PageCursor::start()), "feed/liked/?max_id=");
        assert_eq!(
            location_feed_path("213385402", "1_u", &PageCursor::new("q")),
            "feed/location/213385402/?max_id=q&rank_token=1_u&ranked_content=true&"
        );
    }
}
