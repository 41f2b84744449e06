//! Endpoint surface: thin path/payload wrappers over [`IgClient::send_request`].

mod account;
mod direct;
mod feed;
mod friendships;
mod media;
mod scans;

pub use direct::DirectItem;

use crate::client::IgClient;
use crate::error::Result;
use crate::paginate::{PageCursor, PageShape, PageSource, PaginateOptions, PaginationResult};
use crate::session::Session;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Pages of one GET endpoint; `path` renders the endpoint for a cursor.
struct EndpointPages<'a, F> {
    client: &'a mut IgClient,
    path: F,
}

#[async_trait]
impl<'a, F> PageSource for EndpointPages<'a, F>
where
    F: Fn(&Session, &PageCursor) -> Result<String> + Send + Sync,
{
    async fn fetch_page(&mut self, cursor: &PageCursor) -> Result<Value> {
        let endpoint = (self.path)(&self.client.session, cursor)?;
        self.client.get(&endpoint).await
    }
}

impl IgClient {
    async fn scan<T, F>(
        &mut self,
        shape: PageShape,
        options: PaginateOptions,
        path: F,
    ) -> Result<PaginationResult<T>>
    where
        T: DeserializeOwned + Send,
        F: Fn(&Session, &PageCursor) -> Result<String> + Send + Sync,
    {
        let paginator = self.paginator();
        let mut pages = EndpointPages { client: self, path };
        paginator.run(&mut pages, &shape, options).await
    }
}

/// Path segment escaping for user-supplied strings (hashtags).
fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
