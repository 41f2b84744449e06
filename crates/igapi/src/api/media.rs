use crate::client::IgClient;
use crate::error::Result;
use crate::payload::Payload;
use crate::types::MediaRef;
use serde_json::Value;

pub(crate) fn archive_path(media: &MediaRef, undo: bool) -> String {
    let action = if undo { "undo_only_me" } else { "only_me" };
    format!(
        "media/{}/{action}/?media_type={}",
        media.id, media.media_type
    )
}

fn media_payload(media_id: &str) -> Payload {
    Payload::new().field("media_id", media_id)
}

impl IgClient {
    pub async fn media_info(&mut self, media_id: &str) -> Result<Value> {
        self.post_signed(&format!("media/{media_id}/info/"), media_payload(media_id))
            .await
    }

    /// Replace a post's caption.
    pub async fn edit_media(&mut self, media_id: &str, caption: &str) -> Result<Value> {
        let payload = Payload::new().field("caption_text", caption);
        self.post_signed(&format!("media/{media_id}/edit_media/"), payload)
            .await
    }

    /// Remove the logged-in user's tag from someone else's post.
    pub async fn remove_self_tag(&mut self, media_id: &str) -> Result<Value> {
        self.post_signed(&format!("media/{media_id}/remove/"), Payload::new())
            .await
    }

    /// Hide a post from the profile, or bring it back with `undo`.
    pub async fn archive_media(&mut self, media: &MediaRef, undo: bool) -> Result<Value> {
        self.post_signed(&archive_path(media, undo), media_payload(&media.id))
            .await
    }

    pub async fn delete_media(&mut self, media: &MediaRef) -> Result<Value> {
        self.post_signed(&format!("media/{}/delete/", media.id), media_payload(&media.id))
            .await
    }

    pub async fn like(&mut self, media_id: &str) -> Result<Value> {
        self.post_signed(&format!("media/{media_id}/like/"), media_payload(media_id))
            .await
    }

    pub async fn unlike(&mut self, media_id: &str) -> Result<Value> {
        self.post_signed(&format!("media/{media_id}/unlike/"), media_payload(media_id))
            .await
    }

    pub async fn comment(&mut self, media_id: &str, text: &str) -> Result<Value> {
        let payload = Payload::new().field("comment_text", text);
        self.post_signed(&format!("media/{media_id}/comment/"), payload)
            .await
    }

    pub async fn delete_comment(&mut self, media_id: &str, comment_id: &str) -> Result<Value> {
        self.post_signed(
            &format!("media/{media_id}/comment/{comment_id}/delete/"),
            Payload::new(),
        )
        .await
    }

    pub async fn media_comments(&mut self, media_id: &str) -> Result<Value> {
        self.get(&format!("media/{media_id}/comments/?")).await
    }

    pub async fn media_likers(&mut self, media_id: &str) -> Result<Value> {
        self.get(&format!("media/{media_id}/likers/?")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_paths() {
        let media = MediaRef::new("1_2", 1);
        assert_eq!(archive_path(&media, false), "media/1_2/only_me/?media_type=1");
        assert_eq!(
            archive_path(&media, true),
            "media/1_2/undo_only_me/?media_type=1"
        );
    }

    #[test]
    fn media_payload_carries_id() {
        assert_eq!(media_payload("77").get("media_id"), Some("77"));
    }
}
