use reqwest::Client;

use crate::error::{Service, UpstreamError};
use crate::model::{Post, PostPayload};
use crate::remote::{decode_json, transport};

/// Post meta key holding the Raindrop bookmark id.
pub const META_KEY: &str = "raindrop_id";

pub struct WordPressClient {
    client: Client,
    api_root: String,
    username: String,
    app_password: String,
}

impl WordPressClient {
    /// `site_url` is the WordPress site root; requests go to `/wp-json/wp/v2`.
    pub fn new(site_url: &str, username: &str, app_password: &str) -> Self {
        Self {
            client: Client::new(),
            api_root: format!("{}/wp-json/wp/v2", site_url.trim_end_matches('/')),
            username: username.to_string(),
            app_password: app_password.to_string(),
        }
    }

    pub async fn find_by_raindrop_id(&self, raindrop_id: &str) -> Result<Vec<Post>, UpstreamError> {
        let response = self
            .client
            .get(format!("{}/posts", self.api_root))
            .basic_auth(&self.username, Some(&self.app_password))
            .query(&[("meta_key", META_KEY), ("meta_value", raindrop_id)])
            .send()
            .await
            .map_err(transport(Service::WordPress))?;

        decode_json(Service::WordPress, response).await
    }

    pub async fn create_post(&self, payload: &PostPayload) -> Result<Post, UpstreamError> {
        let response = self
            .client
            .post(format!("{}/posts", self.api_root))
            .basic_auth(&self.username, Some(&self.app_password))
            .json(payload)
            .send()
            .await
            .map_err(transport(Service::WordPress))?;

        decode_json(Service::WordPress, response).await
    }

    pub async fn update_post(&self, id: u64, payload: &PostPayload) -> Result<Post, UpstreamError> {
        let response = self
            .client
            .post(format!("{}/posts/{}", self.api_root, id))
            .basic_auth(&self.username, Some(&self.app_password))
            .json(payload)
            .send()
            .await
            .map_err(transport(Service::WordPress))?;

        decode_json(Service::WordPress, response).await
    }
}
