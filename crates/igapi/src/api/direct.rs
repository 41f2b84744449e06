use crate::client::IgClient;
use crate::error::{IgError, Result};
use crate::payload::Payload;
use crate::signer::generate_uuid;
use serde_json::Value;

/// Something that can be sent to a direct thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectItem {
    Link { text: String, urls: Vec<String> },
    Message { text: String },
    MediaShare {
        media_id: String,
        /// `photo` or `video`.
        media_type: String,
        text: String,
    },
    Like,
    Hashtag { hashtag: String, text: String },
    Profile { profile_user_id: String, text: String },
}

impl DirectItem {
    /// Broadcast endpoint segment.
    pub fn kind(&self) -> &'static str {
        match self {
            DirectItem::Link { .. } => "link",
            DirectItem::Message { .. } => "text",
            DirectItem::MediaShare { .. } => "media_share",
            DirectItem::Like => "like",
            DirectItem::Hashtag { .. } => "hashtag",
            DirectItem::Profile { .. } => "profile",
        }
    }

    fn apply(&self, payload: Payload) -> Result<Payload> {
        Ok(match self {
            DirectItem::Link { text, urls } => payload
                .field("link_text", text.as_str())
                .field("link_urls", serde_json::to_string(urls)?),
            DirectItem::Message { text } => payload.field("text", text.as_str()),
            DirectItem::MediaShare {
                media_id,
                media_type,
                text,
            } => payload
                .field("media_id", media_id.as_str())
                .field("media_type", media_type.as_str())
                .field("text", text.as_str()),
            DirectItem::Like => payload,
            DirectItem::Hashtag { hashtag, text } => payload
                .field("hashtag", hashtag.as_str())
                .field("text", text.as_str()),
            DirectItem::Profile {
                profile_user_id,
                text,
            } => payload
                .field("profile_user_id", profile_user_id.as_str())
                .field("text", text.as_str()),
        })
    }
}

/// `[[a,b]]`; ids are sent unquoted.
pub(crate) fn recipient_users(recipients: &[String]) -> String {
    format!("[[{}]]", recipients.join(","))
}

impl IgClient {
    pub async fn v2_inbox(&mut self) -> Result<Value> {
        self.get("direct_v2/inbox/?").await
    }

    pub async fn direct_share(&mut self) -> Result<Value> {
        self.get("direct_share/inbox/?").await
    }

    /// Send `item` to `recipients`, optionally into an existing thread.
    pub async fn send_direct_item(
        &mut self,
        item: &DirectItem,
        recipients: &[String],
        thread: Option<&str>,
    ) -> Result<Value> {
        if recipients.is_empty() {
            return Err(IgError::InvalidPayload(
                "direct item needs at least one recipient".to_string(),
            ));
        }
        let endpoint = format!("direct_v2/threads/broadcast/{}/", item.kind());
        self.require_auth(&endpoint)?;

        let payload = Payload::new()
            .field("client_context", generate_uuid(true))
            .field("action", "send_item")
            .field("recipient_users", recipient_users(recipients))
            .field_opt("thread_ids", thread.map(|t| format!("[{t}]")))
            .with_session(&self.session)?;
        let body = item.apply(payload)?.to_form()?;
        self.post_form(&endpoint, body).await
    }
}
