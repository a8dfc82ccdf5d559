use reqwest::Client;

use crate::error::{Service, UpstreamError};
use crate::model::{Bookmark, RaindropPage};
use crate::remote::{decode_json, transport};

/// Only the newest page is ever looked at.
pub const PAGE_SIZE: u32 = 10;

pub struct RaindropClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RaindropClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Fetches the newest bookmarks carrying `tag` across all collections.
    pub async fn list_tagged(&self, tag: &str) -> Result<Vec<Bookmark>, UpstreamError> {
        let url = format!("{}/raindrops/0", self.base_url);
        let page_size = PAGE_SIZE.to_string();
        tracing::debug!(url = %url, tag = %tag, "listing raindrops");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[("tag", tag), ("sort", "-created"), ("perpage", page_size.as_str())])
            .send()
            .await
            .map_err(transport(Service::Raindrop))?;

        let page: RaindropPage = decode_json(Service::Raindrop, response).await?;
        Ok(page.items)
    }

    pub async fn latest_tagged(&self, tag: &str) -> Result<Option<Bookmark>, UpstreamError> {
        let items = self.list_tagged(tag).await?;
        Ok(select_tagged(items, tag))
    }
}

/// Picks the first bookmark that really carries `tag`.
///
/// The server already filters by tag; the result is re-checked anyway.
pub fn select_tagged(items: Vec<Bookmark>, tag: &str) -> Option<Bookmark> {
    items.into_iter().find(|b| b.has_tag(tag))
}
