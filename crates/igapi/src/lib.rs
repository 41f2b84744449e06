//! Client for the private Instagram mobile API.
//!
//! Every mutating call is an HMAC-signed form body; the session keeps the
//! CSRF cookie, the logged-in user id and the rank token between calls.
//! Listings are read page by page with an opaque cursor.
//!
//! ```no_run
//! use igapi::{Credentials, IgClient};
//!
//! # async fn run() -> igapi::Result<()> {
//! let mut client = IgClient::new()?;
//! client.login(Credentials::new("alice", "hunter2"), false).await?;
//! let followers = client.total_self_followers().await?;
//! println!("{} followers", followers.len());
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod credentials;
pub mod delay;
pub mod error;
pub mod paginate;
pub mod payload;
pub mod session;
pub mod signer;
pub mod transport;
pub mod types;

pub use api::DirectItem;
pub use client::IgClient;
pub use config::{ClientConfig, ThrottleConfig};
pub use credentials::{CredentialStore, FileCredentialStore};
pub use delay::{Delay, TokioDelay};
pub use error::{IgError, Result};
pub use paginate::{
    Page, PageCursor, PageShape, PageSource, PaginateOptions, PaginationResult, Paginator,
};
pub use payload::Payload;
pub use session::{AuthState, Credentials, Password, Session};
pub use signer::{SignedBody, SignedParts, Signer};
pub use transport::RequestBody;
pub use types::{MediaItem, MediaRef, UserInfo, UserSummary};
