//! The fetch, filter, format, upsert pipeline.
//!
//! Idempotency rests on a lookup followed by a separate create or update.
//! Two overlapping runs can both miss the lookup and create two posts for
//! the same bookmark; callers are expected to trigger one run at a time.

use std::fmt;

use async_trait::async_trait;

use crate::config::Config;
use crate::content::{format_post, should_publish};
use crate::error::UpstreamError;
use crate::model::{Bookmark, Post, PostPayload};
use crate::observe::{SyncEvent, SyncObserver};
use crate::raindrop::RaindropClient;
use crate::wordpress::WordPressClient;

#[async_trait]
pub trait BookmarkSource: Send + Sync {
    async fn latest_tagged(&self, tag: &str) -> Result<Option<Bookmark>, UpstreamError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn find_by_raindrop_id(&self, raindrop_id: &str) -> Result<Vec<Post>, UpstreamError>;
    async fn create_post(&self, payload: &PostPayload) -> Result<Post, UpstreamError>;
    async fn update_post(&self, id: u64, payload: &PostPayload) -> Result<Post, UpstreamError>;
}

#[async_trait]
impl BookmarkSource for RaindropClient {
    async fn latest_tagged(&self, tag: &str) -> Result<Option<Bookmark>, UpstreamError> {
        RaindropClient::latest_tagged(self, tag).await
    }
}

#[async_trait]
impl PostStore for WordPressClient {
    async fn find_by_raindrop_id(&self, raindrop_id: &str) -> Result<Vec<Post>, UpstreamError> {
        WordPressClient::find_by_raindrop_id(self, raindrop_id).await
    }

    async fn create_post(&self, payload: &PostPayload) -> Result<Post, UpstreamError> {
        WordPressClient::create_post(self, payload).await
    }

    async fn update_post(&self, id: u64, payload: &PostPayload) -> Result<Post, UpstreamError> {
        WordPressClient::update_post(self, id, payload).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Lookup,
    Create,
    Update,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Lookup => write!(f, "lookup"),
            Stage::Create => write!(f, "create"),
            Stage::Update => write!(f, "update"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct SyncError {
    pub stage: Stage,
    #[source]
    pub source: UpstreamError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    NoBookmark,
    Skipped(String),
    Updated(u64),
    Created(u64),
}

impl SyncOutcome {
    /// The trigger's 200 response body.
    pub fn message(&self) -> String {
        match self {
            SyncOutcome::NoBookmark => "No bookmarks to process".to_string(),
            SyncOutcome::Skipped(_) => "Bookmark skipped - no content to process".to_string(),
            SyncOutcome::Updated(id) => format!("Updated post {}", id),
            SyncOutcome::Created(id) => format!("Created new post {}", id),
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    Created(u64),
    Updated(u64),
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub sync_tag: String,
    pub post_tag: String,
}

impl From<&Config> for SyncSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            sync_tag: cfg.sync_tag.clone(),
            post_tag: cfg.post_tag.clone(),
        }
    }
}

fn failed(observer: &dyn SyncObserver, stage: Stage) -> impl FnOnce(UpstreamError) -> SyncError + '_ {
    move |source| {
        observer.record(&SyncEvent::Failed {
            stage,
            message: source.to_string(),
        });
        SyncError { stage, source }
    }
}

/// Updates the first post whose `raindrop_id` meta matches, or creates one.
pub async fn upsert<S>(
    store: &S,
    observer: &dyn SyncObserver,
    payload: &PostPayload,
) -> Result<Upsert, SyncError>
where
    S: PostStore + ?Sized,
{
    let raindrop_id = &payload.meta.raindrop_id;
    let existing = store
        .find_by_raindrop_id(raindrop_id)
        .await
        .map_err(failed(observer, Stage::Lookup))?;

    match existing.first() {
        Some(post) => {
            observer.record(&SyncEvent::Updating { post_id: post.id });
            store
                .update_post(post.id, payload)
                .await
                .map_err(failed(observer, Stage::Update))?;
            Ok(Upsert::Updated(post.id))
        }
        None => {
            observer.record(&SyncEvent::Creating {
                bookmark_id: raindrop_id.clone(),
            });
            let created = store
                .create_post(payload)
                .await
                .map_err(failed(observer, Stage::Create))?;
            Ok(Upsert::Created(created.id))
        }
    }
}

pub async fn run<B, S>(
    source: &B,
    store: &S,
    observer: &dyn SyncObserver,
    settings: &SyncSettings,
) -> Result<SyncOutcome, SyncError>
where
    B: BookmarkSource + ?Sized,
    S: PostStore + ?Sized,
{
    observer.record(&SyncEvent::Started);

    let bookmark = source
        .latest_tagged(&settings.sync_tag)
        .await
        .map_err(failed(observer, Stage::Fetch))?;

    let outcome = match bookmark {
        None => {
            observer.record(&SyncEvent::NoBookmark {
                tag: settings.sync_tag.clone(),
            });
            SyncOutcome::NoBookmark
        }
        Some(bookmark) if !should_publish(&bookmark) => {
            observer.record(&SyncEvent::Skipped {
                bookmark_id: bookmark.id.clone(),
            });
            SyncOutcome::Skipped(bookmark.id)
        }
        Some(bookmark) => {
            let payload = format_post(&bookmark, &settings.post_tag);
            match upsert(store, observer, &payload).await? {
                Upsert::Updated(id) => SyncOutcome::Updated(id),
                Upsert::Created(id) => SyncOutcome::Created(id),
            }
        }
    };

    observer.record(&SyncEvent::Finished(outcome.clone()));
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Service;
    use crate::model::Highlight;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<SyncEvent>>);

    impl SyncObserver for Recorder {
        fn record(&self, event: &SyncEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    impl Recorder {
        fn events(&self) -> Vec<SyncEvent> {
            self.0.lock().unwrap().clone()
        }
    }

    struct FixedSource(Option<Bookmark>);

    #[async_trait]
    impl BookmarkSource for FixedSource {
        async fn latest_tagged(&self, _tag: &str) -> Result<Option<Bookmark>, UpstreamError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl BookmarkSource for FailingSource {
        async fn latest_tagged(&self, _tag: &str) -> Result<Option<Bookmark>, UpstreamError> {
            Err(UpstreamError::Status {
                service: Service::Raindrop,
                status: StatusCode::UNAUTHORIZED,
                message: Some("Invalid token".to_string()),
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        existing: Vec<u64>,
        next_id: u64,
        fail_create: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PostStore for MemoryStore {
        async fn find_by_raindrop_id(&self, raindrop_id: &str) -> Result<Vec<Post>, UpstreamError> {
            self.calls.lock().unwrap().push(format!("find {}", raindrop_id));
            Ok(self.existing.iter().map(|&id| Post { id }).collect())
        }

        async fn create_post(&self, payload: &PostPayload) -> Result<Post, UpstreamError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create {}", payload.meta.raindrop_id));
            if self.fail_create {
                return Err(UpstreamError::Status {
                    service: Service::WordPress,
                    status: StatusCode::FORBIDDEN,
                    message: Some("Sorry, you are not allowed to create posts.".to_string()),
                });
            }
            Ok(Post { id: self.next_id })
        }

        async fn update_post(&self, id: u64, _payload: &PostPayload) -> Result<Post, UpstreamError> {
            self.calls.lock().unwrap().push(format!("update {}", id));
            Ok(Post { id })
        }
    }

    impl MemoryStore {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn settings() -> SyncSettings {
        SyncSettings {
            sync_tag: "1".to_string(),
            post_tag: "raindrop".to_string(),
        }
    }

    fn bookmark(note: &str) -> Bookmark {
        Bookmark {
            id: "abc".to_string(),
            title: Some("X".to_string()),
            link: "https://x.com".to_string(),
            created: Some("2024-01-05T00:00:00Z".to_string()),
            note: Some(note.to_string()),
            tags: vec!["1".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_no_bookmark() {
        let store = MemoryStore::default();
        let recorder = Recorder::default();
        let outcome = run(&FixedSource(None), &store, &recorder, &settings()).await.unwrap();
        assert_eq!(outcome, SyncOutcome::NoBookmark);
        assert_eq!(outcome.message(), "No bookmarks to process");
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_skipped_makes_no_store_calls() {
        let store = MemoryStore::default();
        let recorder = Recorder::default();
        let outcome = run(&FixedSource(Some(bookmark(""))), &store, &recorder, &settings())
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped("abc".to_string()));
        assert_eq!(outcome.message(), "Bookmark skipped - no content to process");
        assert!(store.calls().is_empty());
        assert!(recorder.events().contains(&SyncEvent::Skipped {
            bookmark_id: "abc".to_string()
        }));
    }

    #[tokio::test]
    async fn test_creates_when_no_post_matches() {
        let store = MemoryStore {
            next_id: 101,
            ..Default::default()
        };
        let recorder = Recorder::default();
        let outcome = run(&FixedSource(Some(bookmark("Great read"))), &store, &recorder, &settings())
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Created(101));
        assert_eq!(outcome.message(), "Created new post 101");
        assert_eq!(store.calls(), vec!["find abc", "create abc"]);
    }

    #[tokio::test]
    async fn test_updates_first_matching_post() {
        let store = MemoryStore {
            existing: vec![42, 43],
            ..Default::default()
        };
        let recorder = Recorder::default();
        let mut b = bookmark("");
        b.highlights = vec![Highlight {
            text: Some("quote".to_string()),
            note: None,
        }];
        let outcome = run(&FixedSource(Some(b)), &store, &recorder, &settings()).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Updated(42));
        assert_eq!(outcome.message(), "Updated post 42");
        assert_eq!(store.calls(), vec!["find abc", "update 42"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported_once() {
        let store = MemoryStore::default();
        let recorder = Recorder::default();
        let err = run(&FailingSource, &store, &recorder, &settings()).await.unwrap_err();
        assert_eq!(err.stage, Stage::Fetch);
        assert_eq!(err.to_string(), "Invalid token");
        let failures: Vec<_> = recorder
            .events()
            .into_iter()
            .filter(|e| matches!(e, SyncEvent::Failed { .. }))
            .collect();
        assert_eq!(failures.len(), 1);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_propagates_message() {
        let store = MemoryStore {
            fail_create: true,
            ..Default::default()
        };
        let recorder = Recorder::default();
        let err = run(&FixedSource(Some(bookmark("Great read"))), &store, &recorder, &settings())
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::Create);
        assert_eq!(err.to_string(), "Sorry, you are not allowed to create posts.");
        assert!(!recorder
            .events()
            .iter()
            .any(|e| matches!(e, SyncEvent::Finished(_))));
    }
}
