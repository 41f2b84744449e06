use crate::client::IgClient;
use crate::config::SIG_KEY_VERSION;
use crate::error::Result;
use crate::paginate::PageCursor;
use crate::payload::Payload;
use serde_json::Value;

pub(crate) fn followers_path(user_id: &str, rank_token: &str, cursor: &PageCursor) -> String {
    let mut path = format!("friendships/{user_id}/followers/?rank_token={rank_token}");
    if !cursor.is_start() {
        path.push_str("&max_id=");
        path.push_str(cursor.as_str());
    }
    path
}

pub(crate) fn followings_path(user_id: &str, rank_token: &str, cursor: &PageCursor) -> String {
    format!(
        "friendships/{user_id}/following/?max_id={cursor}&ig_sig_key_version={SIG_KEY_VERSION}&rank_token={rank_token}"
    )
}

impl IgClient {
    async fn friendship_action(&mut self, action: &str, user_id: &str) -> Result<Value> {
        let payload = Payload::new().field("user_id", user_id);
        self.post_signed(&format!("friendships/{action}/{user_id}/"), payload)
            .await
    }

    pub async fn follow(&mut self, user_id: &str) -> Result<Value> {
        self.friendship_action("create", user_id).await
    }

    pub async fn unfollow(&mut self, user_id: &str) -> Result<Value> {
        self.friendship_action("destroy", user_id).await
    }

    pub async fn block(&mut self, user_id: &str) -> Result<Value> {
        self.friendship_action("block", user_id).await
    }

    pub async fn unblock(&mut self, user_id: &str) -> Result<Value> {
        self.friendship_action("unblock", user_id).await
    }

    /// Relationship status between the logged-in user and `user_id`.
    pub async fn user_friendship(&mut self, user_id: &str) -> Result<Value> {
        self.friendship_action("show", user_id).await
    }

    /// One page of followers.
    pub async fn user_followers(&mut self, user_id: &str, cursor: &PageCursor) -> Result<Value> {
        let endpoint = followers_path(user_id, self.session.rank_token()?, cursor);
        self.get(&endpoint).await
    }

    /// One page of followings.
    pub async fn user_followings(&mut self, user_id: &str, cursor: &PageCursor) -> Result<Value> {
        let endpoint = followings_path(user_id, self.session.rank_token()?, cursor);
        self.get(&endpoint).await
    }

    pub async fn self_user_followers(&mut self) -> Result<Value> {
        let user_id = self.session.user_id()?.to_string();
        self.user_followers(&user_id, &PageCursor::start()).await
    }

    pub async fn self_user_followings(&mut self) -> Result<Value> {
        let user_id = self.session.user_id()?.to_string();
        self.user_followings(&user_id, &PageCursor::start()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn followers_cursor_is_appended_only_when_set() {
        assert_eq!(
            followers_path("5", "5_u", &PageCursor::start()),
            "friendships/5/followers/?rank_token=5_u"
        );
        assert_eq!(
            followers_path("5", "5_u", &PageCursor::new("QVFE")),
            "friendships/5/followers/?rank_token=5_u&max_id=QVFE"
        );
    }

    #[test]
    fn followings_carry_key_version() {
        assert_eq!(
            followings_path("5", "5_u", &PageCursor::start()),
            "friendships/5/following/?max_id=&ig_sig_key_version=4&rank_token=5_u"
        );
    }
}
