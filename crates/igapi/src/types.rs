//! Response types for the private API.
//!
//! The API is undocumented, so every field the client does not depend on is
//! optional and unknown fields are kept in `extra`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Ids arrive as JSON numbers or strings depending on the endpoint.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(u64),
        Str(String),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    })
}

fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "id_string")] String);
    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

// ---------- Login ----------

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginResponse {
    pub logged_in_user: LoggedInUser,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoggedInUser {
    #[serde(deserialize_with = "id_string")]
    pub pk: String,
}

// ---------- Users ----------

/// Entry of a follower / following list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub pk: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `user` object of `users/<id>/info/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub pk: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub follower_count: Option<u64>,
    #[serde(default)]
    pub following_count: Option<u64>,
    #[serde(default)]
    pub media_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------- Media ----------

/// Feed item (post) from any of the feed endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub pk: Option<String>,
    #[serde(default)]
    pub media_type: Option<u8>,
    #[serde(default)]
    pub taken_at: Option<i64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub caption: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference to a media object for the endpoints that need both id and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub id: String,
    pub media_type: u8,
}

impl MediaRef {
    pub fn new(id: impl Into<String>, media_type: u8) -> Self {
        Self {
            id: id.into(),
            media_type,
        }
    }
}

// ---------- Errors ----------

/// Body of a 400 response.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_pk_accepts_number_or_string() {
        let num: LoginResponse =
            serde_json::from_value(json!({"logged_in_user": {"pk": 1234567}})).expect("num");
        assert_eq!(num.logged_in_user.pk, "1234567");
        let s: LoginResponse =
            serde_json::from_value(json!({"logged_in_user": {"pk": "89"}})).expect("str");
        assert_eq!(s.logged_in_user.pk, "89");
    }

    #[test]
    fn user_summary_keeps_unknown_fields() {
        let user: UserSummary = serde_json::from_value(json!({
            "pk": 5,
            "username": "bob",
            "has_anonymous_profile_picture": true
        }))
        .expect("user");
        assert_eq!(user.pk.as_deref(), Some("5"));
        assert_eq!(user.username.as_deref(), Some("bob"));
        assert_eq!(
            user.extra.get("has_anonymous_profile_picture"),
            Some(&json!(true))
        );
        assert!(user.full_name.is_none());
    }

    #[test]
    fn user_info_counts() {
        let info: UserInfo = serde_json::from_value(json!({
            "pk": "7",
            "follower_count": 1200,
            "following_count": 30
        }))
        .expect("info");
        assert_eq!(info.follower_count, Some(1200));
        assert_eq!(info.following_count, Some(30));
    }

    #[test]
    fn media_item_minimal() {
        let item: MediaItem = serde_json::from_value(json!({"id": "1_2"})).expect("item");
        assert_eq!(item.id.as_deref(), Some("1_2"));
        assert!(item.pk.is_none());
    }
}
