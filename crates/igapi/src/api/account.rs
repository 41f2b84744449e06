use crate::client::IgClient;
use crate::config::EXPERIMENTS;
use crate::error::{IgError, Result};
use crate::payload::Payload;
use crate::session::Password;
use crate::types::UserInfo;
use serde_json::Value;

const PROFILE_EXPERIMENT: &str = "ig_android_profile_contextual_feed";

pub(crate) fn user_info_path(user_id: &str) -> String {
    format!("users/{user_id}/info/")
}

impl IgClient {
    /// Post the experiment list for the logged-in user.
    pub async fn sync_features(&mut self) -> Result<Value> {
        self.require_auth("qe/sync/")?;
        let payload = Payload::new()
            .field("id", self.session.user_id()?)
            .field("experiments", EXPERIMENTS);
        self.post_signed("qe/sync/", payload).await
    }

    pub async fn expose(&mut self) -> Result<Value> {
        self.require_auth("qe/expose/")?;
        let payload = Payload::new()
            .field("id", self.session.user_id()?)
            .field("experiment", PROFILE_EXPERIMENT);
        self.post_signed("qe/expose/", payload).await
    }

    pub async fn auto_complete_user_list(&mut self) -> Result<Value> {
        self.get("friendships/autocomplete_user_list/").await
    }

    pub async fn megaphone_log(&mut self) -> Result<Value> {
        self.get("megaphone/log/").await
    }

    /// Change the account password; the session keeps the new one.
    pub async fn change_password(&mut self, new_password: Password) -> Result<Value> {
        let endpoint = "accounts/change_password/";
        self.require_auth(endpoint)?;
        let old = self
            .session
            .credentials()
            .map(|c| c.password.expose_secret().to_string())
            .ok_or_else(|| IgError::not_authenticated(endpoint))?;
        let payload = Payload::new()
            .field("old_password", old)
            .field("new_password1", new_password.expose_secret())
            .field("new_password2", new_password.expose_secret());
        let response = self.post_signed(endpoint, payload).await?;
        self.session.replace_password(new_password);
        Ok(response)
    }

    pub async fn username_info(&mut self, user_id: &str) -> Result<Value> {
        self.get(&user_info_path(user_id)).await
    }

    pub async fn self_username_info(&mut self) -> Result<Value> {
        let user_id = self.session.user_id()?.to_string();
        self.username_info(&user_id).await
    }

    /// Typed `users/<id>/info/`; `None` when the body has no `user`.
    pub async fn user_info(&mut self, user_id: &str) -> Result<Option<UserInfo>> {
        let body = self.username_info(user_id).await?;
        match body.get("user") {
            Some(user) => UserInfo::deserialize_from(user).map(Some),
            None => Ok(None),
        }
    }

    pub async fn recent_activity(&mut self) -> Result<Value> {
        self.get("news/inbox/?").await
    }

    pub async fn following_recent_activity(&mut self) -> Result<Value> {
        self.get("news/?").await
    }

    /// Link an address book; `contacts` is sent as a JSON form field.
    pub async fn sync_from_address_book(&mut self, contacts: &Value) -> Result<Value> {
        let body = Payload::new()
            .field("contacts", serde_json::to_string(contacts)?)
            .to_form()?;
        self.post_form(
            "address_book/link/?include=extra_display_name,thumbnails",
            body,
        )
        .await
    }
}

impl UserInfo {
    fn deserialize_from(value: &Value) -> Result<Self> {
        serde::Deserialize::deserialize(value)
            .map_err(|e| IgError::malformed(format!("user info: {e}")))
    }
}
