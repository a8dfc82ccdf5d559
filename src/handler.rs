use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::any,
};
use tower_http::trace::TraceLayer;

use crate::auth::authorize;
use crate::config::Config;
use crate::observe::{SyncEvent, SyncObserver, TracingObserver};
use crate::raindrop::RaindropClient;
use crate::sync::{self, BookmarkSource, PostStore, SyncSettings};
use crate::wordpress::WordPressClient;
use crate::{server_error, text_response, unauthorized};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub bookmarks: Arc<dyn BookmarkSource>,
    pub posts: Arc<dyn PostStore>,
    pub observer: Arc<dyn SyncObserver>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let raindrop = RaindropClient::new(&config.raindrop_api_url, &config.raindrop_api_key);
        let wordpress = WordPressClient::new(
            &config.wordpress_api_url,
            &config.wordpress_username,
            &config.wordpress_app_password,
        );

        Self {
            config: Arc::new(config),
            bookmarks: Arc::new(raindrop),
            posts: Arc::new(wordpress),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn settings(&self) -> SyncSettings {
        SyncSettings::from(self.config.as_ref())
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", any(sync_bookmark))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn sync_bookmark(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authorize(&headers, &state.config.sync_secret) {
        state.observer.record(&SyncEvent::Rejected);
        return unauthorized();
    }

    let settings = state.settings();
    match sync::run(
        state.bookmarks.as_ref(),
        state.posts.as_ref(),
        state.observer.as_ref(),
        &settings,
    )
    .await
    {
        Ok(outcome) => text_response(StatusCode::OK, outcome.message()),
        Err(e) => server_error(&e),
    }
}
